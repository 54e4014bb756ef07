use crate::{Event, EventEnvelope};

/// Synchronous observer invoked after every committed change.
///
/// Handlers run on the committing caller's thread, after the store write has
/// succeeded and before the caller gets its result back. They must not fail
/// the commit: anything they cannot do is theirs to log.
pub trait EventHandler<E: Event>: Send + Sync {
    fn handle(&self, envelope: &EventEnvelope<E>);
}

impl<E, H> EventHandler<E> for std::sync::Arc<H>
where
    E: Event,
    H: EventHandler<E> + ?Sized,
{
    fn handle(&self, envelope: &EventEnvelope<E>) {
        (**self).handle(envelope)
    }
}
