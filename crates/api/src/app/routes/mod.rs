use axum::{routing::get, Router};

pub mod couriers;
pub mod notifications;
pub mod orders;
pub mod reports;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/couriers", couriers::router())
        .nest("/notifications", notifications::router())
        .nest("/reports", reports::router())
}
