//! Static routing table: which roles hear about which order event.

use courierflow_auth::Role;
use courierflow_orders::{OrderEvent, OrderEventKind};

use crate::recipient::Recipient;

use OrderEventKind as K;
use Role::{Buyer, Courier, Merchant, Operator};

static ROUTES: &[(OrderEventKind, &[Role])] = &[
    (K::Created, &[Merchant, Operator]),
    (K::Confirmed, &[Buyer]),
    (K::Preparing, &[Buyer]),
    (K::Ready, &[Buyer, Operator]),
    (K::Cancelled, &[Buyer, Operator, Courier]),
    (K::Assigned, &[Courier]),
    (K::Accepted, &[Merchant, Operator]),
    (K::Declined, &[Merchant, Operator]),
    (K::PickedUp, &[Buyer]),
    (K::InTransit, &[Buyer]),
    (K::Delivered, &[Merchant, Operator, Buyer]),
];

pub fn roles_for(kind: OrderEventKind) -> &'static [Role] {
    ROUTES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

/// Mailboxes that receive a notification for `event`.
///
/// The courier is only addressed when the event names one, and the actor who
/// caused the event is never notified about it.
pub fn recipients_for(event: &OrderEvent) -> Vec<Recipient> {
    let actor = Recipient::for_principal(&event.actor);
    roles_for(event.kind)
        .iter()
        .filter_map(|role| match role {
            Operator => Some(Recipient::Operators),
            Merchant => Some(Recipient::Merchant(event.merchant_id)),
            Buyer => Some(Recipient::Buyer(event.buyer_id)),
            Courier => event.courier_id.map(Recipient::Courier),
        })
        .filter(|r| *r != actor)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courierflow_auth::Principal;
    use courierflow_core::{ActorId, BuyerId, CourierId, MerchantId, OrderId};

    fn event(kind: OrderEventKind, actor: Principal, courier: Option<CourierId>) -> OrderEvent {
        OrderEvent {
            kind,
            order_id: OrderId::new(),
            order_number: "ORD-00000000AA".to_string(),
            merchant_id: MerchantId::new(),
            buyer_id: BuyerId::new(),
            courier_id: courier,
            total_amount: 1_000,
            actor,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn every_event_kind_has_a_route() {
        for kind in OrderEventKind::ALL {
            assert!(!roles_for(kind).is_empty(), "{}", kind.as_str());
        }
    }

    #[test]
    fn created_goes_to_merchant_and_operators() {
        let e = event(K::Created, Principal::buyer(ActorId::new()), None);
        assert_eq!(
            recipients_for(&e),
            vec![Recipient::Merchant(e.merchant_id), Recipient::Operators]
        );
    }

    #[test]
    fn assigned_goes_to_the_courier() {
        let c = CourierId::new();
        let e = event(K::Assigned, Principal::operator(ActorId::new()), Some(c));
        assert_eq!(recipients_for(&e), vec![Recipient::Courier(c)]);
    }

    #[test]
    fn cancelled_skips_courier_when_none_was_bound_and_skips_the_actor() {
        let e = event(K::Cancelled, Principal::operator(ActorId::new()), None);
        assert_eq!(recipients_for(&e), vec![Recipient::Buyer(e.buyer_id)]);
    }

    #[test]
    fn delivered_reaches_three_parties() {
        let c = CourierId::new();
        let e = event(K::Delivered, Principal::courier(c.into()), Some(c));
        assert_eq!(recipients_for(&e).len(), 3);
    }
}
