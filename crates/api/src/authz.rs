//! API-side authorization guard.
//!
//! This enforces the role permission table at the request boundary (before
//! the engine is called). Whether the caller owns the particular order is
//! still decided by the domain.

use axum::http::StatusCode;
use axum::response::Response;

use courierflow_auth::{authorize, Permission};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Check that the caller's role grants `permission`.
pub fn require(principal: &PrincipalContext, permission: Permission) -> Result<(), Response> {
    authorize(principal.principal(), permission)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
