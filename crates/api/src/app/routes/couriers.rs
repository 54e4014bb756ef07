use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use courierflow_auth::{Permission, Role};
use courierflow_core::CourierId;
use courierflow_infra::projections::CourierStats;
use courierflow_orders::NewCourier;

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_couriers).post(register_courier))
        .route("/available", get(available_couriers))
        .route("/:id/active", post(set_active))
        .route("/:id/stats", get(courier_stats))
}

pub async fn available_couriers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::CouriersRead) {
        return resp;
    }
    match services.engine.available_couriers(principal.principal()) {
        Ok(couriers) => Json(couriers).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn list_couriers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::CouriersAdmin) {
        return resp;
    }
    match services.engine.couriers(principal.principal()) {
        Ok(couriers) => Json(couriers).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn register_courier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewCourier>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::CouriersAdmin) {
        return resp;
    }
    match services.engine.register_courier(principal.principal(), body) {
        Ok(courier) => (StatusCode::CREATED, Json(courier)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn set_active(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetActiveRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::CouriersAdmin) {
        return resp;
    }
    let id: CourierId = match errors::parse_id(&id, "courier") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .engine
        .set_courier_active(principal.principal(), id, body.active)
    {
        Ok(courier) => Json(courier).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Delivery statistics. Couriers may only read their own.
pub async fn courier_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::CourierStatsRead) {
        return resp;
    }
    let id: CourierId = match errors::parse_id(&id, "courier") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if principal.role() == Role::Courier && CourierId::from(principal.actor_id()) != id {
        return errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "couriers can only read their own statistics",
        );
    }

    let stats = services.stats.get(id).unwrap_or_else(|| CourierStats::new(id));
    Json(stats).into_response()
}
