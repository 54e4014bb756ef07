use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use courierflow_auth::{Permission, Role};
use courierflow_core::{CourierId, OrderId};
use courierflow_infra::engine::DispatchError;
use courierflow_infra::query::OrderQuery;
use courierflow_orders::{Order, TargetStatus, Track};

use crate::app::{dto, errors};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/history", get(order_history))
        .route("/:id/route", get(order_route))
        .route("/:id/status", post(change_status))
        .route("/:id/assign", post(assign_courier))
        .route("/:id/reassign", post(reassign_courier))
        .route("/:id/accept", post(accept_order))
        .route("/:id/decline", post(decline_order))
        .route("/:id/proof", post(submit_proof))
}

fn order_response(order: Order) -> axum::response::Response {
    (StatusCode::OK, Json(dto::OrderResponse::from(order))).into_response()
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<OrderQuery>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersRead) {
        return resp;
    }
    match services.queries.query(principal.principal(), &query) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersCreate) {
        return resp;
    }
    let (new, descriptor) = body.into_parts();
    match services
        .engine
        .create_order(principal.principal(), new, descriptor.as_deref())
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(dto::OrderResponse::from(order))).into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersRead) {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.get_order(principal.principal(), id) {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn order_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersRead) {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.history(principal.principal(), id) {
        Ok(history) => Json(dto::HistoryResponse {
            items: history.entries().to_vec(),
        })
        .into_response(),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

/// Route details for the bound courier, the owning merchant and operators.
pub async fn order_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if principal.role() == Role::Buyer {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "buyers cannot view routes");
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if let Err(e) = services.engine.get_order(principal.principal(), id) {
        return errors::dispatch_error_to_response(e);
    }
    let Some(provider) = services.routes.clone() else {
        return errors::json_error(
            StatusCode::NOT_IMPLEMENTED,
            "not_configured",
            "no route provider configured",
        );
    };
    match provider.get_route(id).await {
        Ok(route) => Json(route).into_response(),
        Err(e) => errors::dispatch_error_to_response(e.into()),
    }
}

pub async fn change_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::StatusChangeRequest>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let target: TargetStatus = match body.status.parse() {
        Ok(t) => t,
        Err(e) => return errors::dispatch_error_to_response(DispatchError::from(e)),
    };
    let permission = match target.track() {
        Track::Merchant => Permission::OrdersMerchantStatus,
        Track::Delivery => Permission::OrdersDeliveryStatus,
    };
    if let Err(resp) = require(&principal, permission) {
        return resp;
    }

    match services.engine.transition(principal.principal(), id, target) {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn assign_courier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignRequest>,
) -> axum::response::Response {
    bind_courier(&services, &principal, &id, &body.courier_id, false)
}

pub async fn reassign_courier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignRequest>,
) -> axum::response::Response {
    bind_courier(&services, &principal, &id, &body.courier_id, true)
}

fn bind_courier(
    services: &AppServices,
    principal: &PrincipalContext,
    order_id: &str,
    courier_id: &str,
    reassign: bool,
) -> axum::response::Response {
    if let Err(resp) = require(principal, Permission::OrdersAssign) {
        return resp;
    }
    let order_id: OrderId = match errors::parse_id(order_id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let courier_id: CourierId = match errors::parse_id(courier_id, "courier") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let result = if reassign {
        services.engine.reassign(principal.principal(), order_id, courier_id)
    } else {
        services.engine.assign(principal.principal(), order_id, courier_id)
    };
    match result {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn accept_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersDeliveryStatus) {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.accept(principal.principal(), id) {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn decline_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersDeliveryStatus) {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.decline(principal.principal(), id) {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}

pub async fn submit_proof(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProofRequest>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::OrdersDeliveryStatus) {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.engine.submit_proof(principal.principal(), id, &body.images) {
        Ok(order) => order_response(order),
        Err(e) => errors::dispatch_error_to_response(e),
    }
}
