use chrono::{DateTime, Utc};

use courierflow_core::OrderId;

/// A committed fact about one order.
///
/// Events are published only after the change they describe is durable, so a
/// consumer never sees an event whose order state was rolled back.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted identifier (e.g. "order.assigned").
    fn event_type(&self) -> &'static str;

    /// Order this event belongs to.
    fn order_id(&self) -> OrderId;

    fn occurred_at(&self) -> DateTime<Utc>;
}
