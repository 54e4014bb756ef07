use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_auth::Principal;
use courierflow_core::{BuyerId, CourierId, MerchantId, OrderId};
use courierflow_events::Event;

use crate::order::Order;

/// What happened to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    Confirmed,
    Preparing,
    Ready,
    Cancelled,
    Assigned,
    Accepted,
    Declined,
    PickedUp,
    InTransit,
    Delivered,
}

impl OrderEventKind {
    pub const ALL: [OrderEventKind; 11] = [
        OrderEventKind::Created,
        OrderEventKind::Confirmed,
        OrderEventKind::Preparing,
        OrderEventKind::Ready,
        OrderEventKind::Cancelled,
        OrderEventKind::Assigned,
        OrderEventKind::Accepted,
        OrderEventKind::Declined,
        OrderEventKind::PickedUp,
        OrderEventKind::InTransit,
        OrderEventKind::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventKind::Created => "order.created",
            OrderEventKind::Confirmed => "order.confirmed",
            OrderEventKind::Preparing => "order.preparing",
            OrderEventKind::Ready => "order.ready",
            OrderEventKind::Cancelled => "order.cancelled",
            OrderEventKind::Assigned => "order.assigned",
            OrderEventKind::Accepted => "order.accepted",
            OrderEventKind::Declined => "order.declined",
            OrderEventKind::PickedUp => "order.picked_up",
            OrderEventKind::InTransit => "order.in_transit",
            OrderEventKind::Delivered => "order.delivered",
        }
    }
}

/// Event: a committed change to an order.
///
/// Carries enough denormalized data (parties, courier, amount) for consumers
/// to route notifications and fold statistics without reading the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub order_id: OrderId,
    pub order_number: String,
    pub merchant_id: MerchantId,
    pub buyer_id: BuyerId,
    /// Courier concerned by the change (the bound one, or the one just
    /// released by a decline or cancellation).
    pub courier_id: Option<CourierId>,
    pub total_amount: u64,
    pub actor: Principal,
    pub occurred_at: DateTime<Utc>,
}

impl OrderEvent {
    pub fn for_order(
        kind: OrderEventKind,
        order: &Order,
        courier_id: Option<CourierId>,
        actor: Principal,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            order_id: order.id_typed(),
            order_number: order.order_number().to_string(),
            merchant_id: order.merchant_id(),
            buyer_id: order.buyer_id(),
            courier_id,
            total_amount: order.total_amount(),
            actor,
            occurred_at,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        self.kind.as_str()
    }

    fn order_id(&self) -> OrderId {
        self.order_id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
