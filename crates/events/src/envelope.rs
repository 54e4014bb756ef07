use serde::{Deserialize, Serialize};
use uuid::Uuid;

use courierflow_core::OrderId;

/// Envelope for an order event, containing stream metadata.
///
/// Notes:
/// - `sequence_number` is the order's version after the change, so it is
///   monotonically increasing per order.
/// - `event_id` is unique per committed change; consumers dedupe on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    order_id: OrderId,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, order_id: OrderId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            order_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
