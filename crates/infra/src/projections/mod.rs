//! Projection implementations (read model builders).
//!
//! Projections consume committed order events from the bus and build
//! query-optimized read models. All projections are:
//! - **Rebuildable**: can be reconstructed from the event stream
//! - **Idempotent**: safe for at-least-once delivery

pub mod courier_stats;

pub use courier_stats::{CourierStats, CourierStatsProjection};
