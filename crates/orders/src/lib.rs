//! Order lifecycle domain module.
//!
//! This crate contains the business rules for orders and couriers, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Every
//! state change is decided by a function that takes the current state and
//! returns a [`Transition`]: the next state, the single audit entry it
//! appended, the event to publish and any courier availability side effect.

pub mod assignment;
pub mod courier;
pub mod events;
pub mod history;
pub mod order;
pub mod proof;
pub mod transitions;

pub use courier::{Courier, CourierAssignment, NewCourier, Vehicle};
pub use events::{OrderEvent, OrderEventKind};
pub use history::{HistoryEntry, StatusHistory, TrackedStatus};
pub use order::{DeliveryStatus, LineItem, NewOrder, Order, OrderStatus};
pub use proof::{
    ProofImage, ProofPolicy, DEFAULT_MAX_PROOF_IMAGE_BYTES, DEFAULT_PROOF_MIME_TYPES,
    REQUIRED_PROOF_IMAGES,
};
pub use transitions::{
    resolve_display_status, transition, CourierEffect, TargetStatus, Track, Transition,
};
