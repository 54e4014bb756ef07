//! Domain events, envelopes and in-process distribution.
//!
//! Committed order changes are wrapped in an [`EventEnvelope`] and handed to
//! synchronous [`EventHandler`]s (notification fan-out) and to an [`EventBus`]
//! (projections and other asynchronous consumers).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;
pub mod projection;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use projection::Projection;
