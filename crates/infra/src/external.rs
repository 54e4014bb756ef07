//! External service clients/adapters.
//!
//! Only the contracts live here; matching, routing and spreadsheet generation
//! are someone else's problem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use courierflow_core::{ActorId, OrderId};

use crate::projections::courier_stats::CourierStats;
use crate::query::OrderView;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExternalError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub is_match: bool,
}

/// Checkout gate: does this face descriptor belong to the buyer?
#[async_trait]
pub trait BiometricVerifier: Send + Sync {
    async fn verify(&self, buyer: ActorId, descriptor: &[f32]) -> Result<Verification, ExternalError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub pickup: String,
    pub delivery: String,
    pub distance_km: f64,
    pub eta_minutes: u32,
    pub route_url: String,
}

#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn get_route(&self, order_id: OrderId) -> Result<RouteInfo, ExternalError>;
}

/// Read-only input for reporting/export.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSnapshot {
    pub generated_at: DateTime<Utc>,
    pub orders: Vec<OrderView>,
    pub statistics: Vec<CourierStats>,
}
