use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use courierflow_auth::Permission;
use courierflow_core::NotificationId;
use courierflow_infra::engine::DispatchError;
use courierflow_infra::notifications::Mailbox;
use courierflow_notifications::Recipient;

use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::authz::require;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/stream", get(stream))
        .route("/:id/read", post(mark_read))
}

fn recipient(principal: &PrincipalContext) -> Recipient {
    Recipient::for_principal(principal.principal())
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::NotificationListQuery>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::NotificationsRead) {
        return resp;
    }
    let recipient = recipient(&principal);
    let items = if query.unread_only {
        services.mailbox.list_unread(recipient, query.limit, query.offset)
    } else {
        services.mailbox.list(recipient, query.limit, query.offset)
    };
    let result = items.and_then(|items| {
        let unread_count = services.mailbox.unread_count(recipient)?;
        Ok(dto::NotificationListResponse {
            items,
            unread_count,
        })
    });
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => errors::dispatch_error_to_response(DispatchError::from(e)),
    }
}

pub async fn unread_count(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::NotificationsRead) {
        return resp;
    }
    match services.mailbox.unread_count(recipient(&principal)) {
        Ok(count) => Json(serde_json::json!({ "count": count })).into_response(),
        Err(e) => errors::dispatch_error_to_response(DispatchError::from(e)),
    }
}

pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::NotificationsRead) {
        return resp;
    }
    let id: NotificationId = match errors::parse_id(&id, "notification") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.mailbox.mark_read(recipient(&principal), id) {
        Ok(()) => Json(serde_json::json!({})).into_response(),
        Err(e) => errors::dispatch_error_to_response(DispatchError::from(e)),
    }
}

pub async fn mark_all_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::NotificationsRead) {
        return resp;
    }
    match services.mailbox.mark_all_read(recipient(&principal)) {
        Ok(marked) => Json(serde_json::json!({ "marked": marked })).into_response(),
        Err(e) => errors::dispatch_error_to_response(DispatchError::from(e)),
    }
}

/// SSE stream of the caller's unread count.
pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(resp) = require(&principal, Permission::NotificationsRead) {
        return resp;
    }
    services::unread_count_sse_stream(services, recipient(&principal)).into_response()
}
