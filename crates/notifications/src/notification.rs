use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_core::{NotificationId, OrderId};
use courierflow_orders::{OrderEvent, OrderEventKind};

use crate::navigation::navigation_target;
use crate::recipient::Recipient;

/// A message in one recipient's mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: Recipient,
    pub kind: OrderEventKind,
    pub order_id: OrderId,
    pub title: String,
    pub message: String,
    /// Dashboard route to open on click.
    pub link: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_event(id: NotificationId, recipient: Recipient, event: &OrderEvent) -> Self {
        let title = title_for(event.kind);
        Self {
            id,
            recipient,
            kind: event.kind,
            order_id: event.order_id,
            title: title.to_string(),
            message: format!("{title}: {}", event.order_number),
            link: navigation_target(recipient.role(), event.kind, event.order_id),
            is_read: false,
            created_at: event.occurred_at,
        }
    }
}

fn title_for(kind: OrderEventKind) -> &'static str {
    match kind {
        OrderEventKind::Created => "New order",
        OrderEventKind::Confirmed => "Order confirmed",
        OrderEventKind::Preparing => "Order is being prepared",
        OrderEventKind::Ready => "Order ready for pickup",
        OrderEventKind::Cancelled => "Order cancelled",
        OrderEventKind::Assigned => "New delivery assigned",
        OrderEventKind::Accepted => "Courier accepted the delivery",
        OrderEventKind::Declined => "Courier declined the delivery",
        OrderEventKind::PickedUp => "Order picked up",
        OrderEventKind::InTransit => "Order on its way",
        OrderEventKind::Delivered => "Order delivered",
    }
}
