use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};

use courierflow_auth::Permission;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/snapshot", get(snapshot))
}

pub async fn snapshot(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::ReportsRead) {
        return resp;
    }
    match services.report_snapshot(principal.principal()) {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
