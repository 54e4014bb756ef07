use crate::{Event, EventEnvelope};

/// A read model folded from a stream of envelopes.
///
/// Delivery is at-least-once, so `apply` must tolerate the same envelope twice.
pub trait Projection {
    type Ev: Event;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
