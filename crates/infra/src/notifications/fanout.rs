use tracing::{debug, warn};

use courierflow_core::NotificationId;
use courierflow_events::{EventEnvelope, EventHandler};
use courierflow_notifications::{recipients_for, Notification};
use courierflow_orders::OrderEvent;

use super::mailbox::Mailbox;

/// Deposits one notification per routed recipient for every committed change.
///
/// Runs after the commit; a mailbox failure is logged and never undoes the
/// change that triggered it.
#[derive(Debug)]
pub struct NotificationFanout<M> {
    mailbox: M,
}

impl<M> NotificationFanout<M> {
    pub fn new(mailbox: M) -> Self {
        Self { mailbox }
    }
}

impl<M> NotificationFanout<M>
where
    M: Mailbox,
{
    pub fn on_transition(&self, event: &OrderEvent) {
        for recipient in recipients_for(event) {
            let notification = Notification::from_event(NotificationId::new(), recipient, event);
            match self.mailbox.deposit(notification) {
                Ok(()) => debug!(
                    order = %event.order_number,
                    event = event.kind.as_str(),
                    role = recipient.role().as_str(),
                    "notification deposited"
                ),
                Err(err) => warn!(
                    order = %event.order_number,
                    event = event.kind.as_str(),
                    error = %err,
                    "failed to deposit notification"
                ),
            }
        }
    }
}

impl<M> EventHandler<OrderEvent> for NotificationFanout<M>
where
    M: Mailbox,
{
    fn handle(&self, envelope: &EventEnvelope<OrderEvent>) {
        self.on_transition(envelope.payload());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::InMemoryMailbox;
    use chrono::Utc;
    use courierflow_auth::Principal;
    use courierflow_core::{ActorId, BuyerId, CourierId, MerchantId, OrderId};
    use courierflow_notifications::Recipient;
    use courierflow_orders::OrderEventKind;
    use std::sync::Arc;

    #[test]
    fn delivered_reaches_merchant_operators_and_buyer() {
        let mailbox = Arc::new(InMemoryMailbox::new());
        let fanout = NotificationFanout::new(mailbox.clone());
        let courier = CourierId::new();
        let event = OrderEvent {
            kind: OrderEventKind::Delivered,
            order_id: OrderId::new(),
            order_number: "ORD-00000000FF".to_string(),
            merchant_id: MerchantId::new(),
            buyer_id: BuyerId::new(),
            courier_id: Some(courier),
            total_amount: 900,
            actor: Principal::courier(ActorId::from(courier)),
            occurred_at: Utc::now(),
        };

        fanout.on_transition(&event);

        assert_eq!(mailbox.unread_count(Recipient::Merchant(event.merchant_id)).unwrap(), 1);
        assert_eq!(mailbox.unread_count(Recipient::Buyer(event.buyer_id)).unwrap(), 1);
        assert_eq!(mailbox.unread_count(Recipient::Operators).unwrap(), 1);
        assert_eq!(mailbox.unread_count(Recipient::Courier(courier)).unwrap(), 0);

        let n = &mailbox.list(Recipient::Merchant(event.merchant_id), 1, 0).unwrap()[0];
        assert_eq!(n.link, format!("/merchant/orders/{}", event.order_id));
    }
}
