//! `courierflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error taxonomy and the aggregate contract.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::AggregateRoot;
pub use error::DomainError;
pub use id::{ActorId, BuyerId, CourierId, MerchantId, NotificationId, OrderId};
