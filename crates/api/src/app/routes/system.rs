use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use courierflow_auth::permissions::permissions_for;

use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "actor_id": principal.actor_id().to_string(),
        "role": principal.role().as_str(),
        "permissions": permissions_for(principal.role())
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>(),
    }))
}
