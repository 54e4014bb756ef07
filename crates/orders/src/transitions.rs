//! Status transition engine.
//!
//! Pure decision logic: given the current order, the acting principal and a
//! requested status, decide legality and produce the next state plus exactly
//! one audit entry. Legality lives in static tables keyed by status and role.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_auth::{Principal, Role};
use courierflow_core::{CourierId, DomainError};

use crate::events::{OrderEvent, OrderEventKind};
use crate::history::{HistoryEntry, TrackedStatus};
use crate::order::{DeliveryStatus, Order, OrderStatus};
use crate::proof::REQUIRED_PROOF_IMAGES;

/// Lifecycle track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Merchant-facing `status`.
    Merchant,
    /// Courier-facing `delivery_status`.
    Delivery,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Merchant => "merchant",
            Track::Delivery => "delivery",
        }
    }
}

/// A status that can be requested through [`transition`].
///
/// `assigned` and `awaiting_assignment` are deliberately absent: only the
/// assignment decisions produce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Confirmed,
    Preparing,
    Ready,
    Cancelled,
    Accepted,
    PickedUp,
    InTransit,
    Delivered,
}

impl TargetStatus {
    pub const ALL: [TargetStatus; 8] = [
        TargetStatus::Confirmed,
        TargetStatus::Preparing,
        TargetStatus::Ready,
        TargetStatus::Cancelled,
        TargetStatus::Accepted,
        TargetStatus::PickedUp,
        TargetStatus::InTransit,
        TargetStatus::Delivered,
    ];

    pub fn tracked(&self) -> TrackedStatus {
        match self {
            TargetStatus::Confirmed => TrackedStatus::Order(OrderStatus::Confirmed),
            TargetStatus::Preparing => TrackedStatus::Order(OrderStatus::Preparing),
            TargetStatus::Ready => TrackedStatus::Order(OrderStatus::Ready),
            TargetStatus::Cancelled => TrackedStatus::Order(OrderStatus::Cancelled),
            TargetStatus::Accepted => TrackedStatus::Delivery(DeliveryStatus::Accepted),
            TargetStatus::PickedUp => TrackedStatus::Delivery(DeliveryStatus::PickedUp),
            TargetStatus::InTransit => TrackedStatus::Delivery(DeliveryStatus::InTransit),
            TargetStatus::Delivered => TrackedStatus::Delivery(DeliveryStatus::Delivered),
        }
    }

    pub fn track(&self) -> Track {
        match self.tracked() {
            TrackedStatus::Order(_) => Track::Merchant,
            TrackedStatus::Delivery(_) => Track::Delivery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self.tracked() {
            TrackedStatus::Order(s) => s.as_str(),
            TrackedStatus::Delivery(s) => s.as_str(),
        }
    }

    fn event_kind(&self) -> OrderEventKind {
        match self {
            TargetStatus::Confirmed => OrderEventKind::Confirmed,
            TargetStatus::Preparing => OrderEventKind::Preparing,
            TargetStatus::Ready => OrderEventKind::Ready,
            TargetStatus::Cancelled => OrderEventKind::Cancelled,
            TargetStatus::Accepted => OrderEventKind::Accepted,
            TargetStatus::PickedUp => OrderEventKind::PickedUp,
            TargetStatus::InTransit => OrderEventKind::InTransit,
            TargetStatus::Delivered => OrderEventKind::Delivered,
        }
    }
}

impl FromStr for TargetStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetStatus::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("'{s}' is not a requestable status")))
    }
}

use DeliveryStatus as D;
use OrderStatus as O;

static MERCHANT_TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (O::Pending, &[O::Confirmed, O::Cancelled]),
    (O::Confirmed, &[O::Preparing, O::Cancelled]),
    (O::Preparing, &[O::Ready, O::Cancelled]),
    (O::Ready, &[O::Cancelled]),
    (O::Delivered, &[]),
    (O::Cancelled, &[]),
];

static DELIVERY_TRANSITIONS: &[(DeliveryStatus, &[DeliveryStatus])] = &[
    (D::Assigned, &[D::Accepted]),
    (D::Accepted, &[D::PickedUp]),
    (D::PickedUp, &[D::InTransit]),
    (D::InTransit, &[D::Delivered]),
];

static TRACK_AUTHORITY: &[(Role, &[Track])] = &[
    (Role::Merchant, &[Track::Merchant]),
    (Role::Operator, &[Track::Merchant]),
    (Role::Courier, &[Track::Delivery]),
    (Role::Buyer, &[]),
];

pub fn merchant_next(from: OrderStatus) -> &'static [OrderStatus] {
    MERCHANT_TRANSITIONS
        .iter()
        .find(|(s, _)| *s == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn delivery_next(from: Option<DeliveryStatus>) -> &'static [DeliveryStatus] {
    from.and_then(|from| DELIVERY_TRANSITIONS.iter().find(|(s, _)| *s == from))
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

pub fn has_authority(role: Role, track: Track) -> bool {
    TRACK_AUTHORITY
        .iter()
        .any(|(r, tracks)| *r == role && tracks.contains(&track))
}

fn is_listed(order: &Order, target: TargetStatus) -> bool {
    match target.tracked() {
        TrackedStatus::Order(to) => merchant_next(order.status).contains(&to),
        TrackedStatus::Delivery(to) => {
            order.status != OrderStatus::Cancelled
                && delivery_next(order.delivery_status).contains(&to)
        }
    }
}

/// Legal next statuses for `role` on `order`, across the tracks it controls.
pub fn legal_next(order: &Order, role: Role) -> Vec<TargetStatus> {
    TargetStatus::ALL
        .into_iter()
        .filter(|t| has_authority(role, t.track()) && is_listed(order, *t))
        .collect()
}

/// Courier availability change that must be committed atomically with the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CourierEffect {
    /// Compare-and-set: courier must be active and available; flips it to unavailable.
    Bind(CourierId),
    /// Courier becomes available again.
    Release(CourierId),
}

/// Outcome of an accepted decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Next state, version already bumped.
    pub order: Order,
    /// The single entry appended to `order.status_history()`.
    pub entry: HistoryEntry,
    pub event: OrderEvent,
    pub courier_effect: Option<CourierEffect>,
    /// Version the decision was taken against; the commit must still see it.
    pub previous_version: u64,
}

/// Decide a requested status change.
///
/// Checks, in order: track authority, ownership, table legality, proof of
/// delivery for `delivered`.
pub fn transition(
    order: &Order,
    target: TargetStatus,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    let track = target.track();
    if !has_authority(actor.role, track) {
        return Err(DomainError::forbidden(format!(
            "role '{}' has no authority over the {} track",
            actor.role,
            track.as_str()
        )));
    }
    ensure_owner(order, actor)?;

    if !is_listed(order, target) {
        return Err(invalid_transition(order, target.track(), target.as_str(), actor.role));
    }

    let mut next = order.clone();
    let mut courier_effect = None;

    match target.tracked() {
        TrackedStatus::Order(to) => {
            next.status = to;
            if to == OrderStatus::Cancelled {
                if let Some(courier_id) = order.bound_courier() {
                    next.courier_assignment = None;
                    courier_effect = Some(CourierEffect::Release(courier_id));
                }
            }
        }
        TrackedStatus::Delivery(to) => {
            if to == DeliveryStatus::Delivered {
                if order.proof_of_delivery_images.len() != REQUIRED_PROOF_IMAGES {
                    return Err(DomainError::validation(format!(
                        "exactly {REQUIRED_PROOF_IMAGES} proof-of-delivery images are required"
                    )));
                }
                next.status = OrderStatus::Delivered;
                next.delivered_at = Some(now);
                courier_effect = order.bound_courier().map(CourierEffect::Release);
            }
            next.delivery_status = Some(to);
        }
    }

    Ok(seal(
        next,
        order,
        target.tracked(),
        target.event_kind(),
        order.bound_courier(),
        courier_effect,
        actor,
        now,
    ))
}

/// Append the audit entry, bump the version and build the event.
#[allow(clippy::too_many_arguments)]
pub(crate) fn seal(
    mut next: Order,
    previous: &Order,
    status: TrackedStatus,
    kind: OrderEventKind,
    courier_id: Option<CourierId>,
    courier_effect: Option<CourierEffect>,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Transition {
    let entry = next.status_history.append(status, *actor, now).clone();
    next.version = previous.version + 1;
    let event = OrderEvent::for_order(kind, &next, courier_id, *actor, entry.at);

    Transition {
        order: next,
        entry,
        event,
        courier_effect,
        previous_version: previous.version,
    }
}

/// Merchants act on their own orders, couriers on orders bound to them,
/// operators on any order.
pub(crate) fn ensure_owner(order: &Order, actor: &Principal) -> Result<(), DomainError> {
    match actor.role {
        Role::Operator => Ok(()),
        Role::Merchant if order.merchant_id == actor.actor_id => Ok(()),
        Role::Merchant => Err(DomainError::forbidden("merchant does not own this order")),
        Role::Courier if order.bound_courier().is_some_and(|c| c == actor.actor_id) => Ok(()),
        Role::Courier => Err(DomainError::forbidden("courier is not assigned to this order")),
        Role::Buyer => Err(DomainError::forbidden("buyers cannot change order status")),
    }
}

pub(crate) fn invalid_transition(order: &Order, track: Track, to: &str, role: Role) -> DomainError {
    let from = match track {
        Track::Merchant => order.status.as_str(),
        Track::Delivery => order
            .delivery_status
            .map(|d| d.as_str())
            .unwrap_or("unassigned"),
    };
    let allowed = legal_next(order, role)
        .into_iter()
        .map(|t| t.as_str().to_string())
        .collect();
    DomainError::invalid_transition(from, to, allowed)
}

/// Status shown to users.
///
/// Pure. `cancelled` dominates everything; then `delivered` on either track;
/// otherwise the raw merchant-facing status.
pub fn resolve_display_status(order: &Order) -> OrderStatus {
    if order.status == OrderStatus::Cancelled {
        OrderStatus::Cancelled
    } else if order.delivery_status == Some(DeliveryStatus::Delivered)
        || order.status == OrderStatus::Delivered
    {
        OrderStatus::Delivered
    } else {
        order.status
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assignment;
    use crate::courier::tests::new_courier;
    use crate::courier::Courier;
    use crate::order::tests::new_order;
    use courierflow_core::{ActorId, AggregateRoot, MerchantId, OrderId};
    use proptest::prelude::*;

    pub(crate) struct Fixture {
        pub order: Order,
        pub merchant: Principal,
        pub operator: Principal,
    }

    pub(crate) fn placed() -> Fixture {
        let merchant = Principal::merchant(ActorId::new());
        let buyer = Principal::buyer(ActorId::new());
        let order = Order::place(
            OrderId::new(),
            new_order(MerchantId::from(merchant.actor_id)),
            &buyer,
            Utc::now(),
        )
        .unwrap();
        Fixture {
            order,
            merchant,
            operator: Principal::operator(ActorId::new()),
        }
    }

    pub(crate) fn ready() -> Fixture {
        let mut f = placed();
        for t in [TargetStatus::Confirmed, TargetStatus::Preparing, TargetStatus::Ready] {
            f.order = transition(&f.order, t, &f.merchant, Utc::now()).unwrap().order;
        }
        f
    }

    /// Ready order with a freshly bound courier; returns the courier principal.
    pub(crate) fn assigned() -> (Fixture, Courier, Principal) {
        let mut f = ready();
        let mut courier = Courier::register(
            courierflow_core::CourierId::new(),
            new_courier("Grace"),
        )
        .unwrap();
        let t = assignment::assign(&f.order, &courier, &f.merchant, Utc::now()).unwrap();
        courier.mark_bound().unwrap();
        f.order = t.order;
        let principal = Principal::courier(ActorId::from(courier.id_typed()));
        (f, courier, principal)
    }

    #[test]
    fn merchant_walks_the_merchant_track() {
        let f = ready();
        assert_eq!(f.order.status(), OrderStatus::Ready);
        assert_eq!(f.order.status_history().len(), 4);
        assert_eq!(f.order.version(), 4);
    }

    #[test]
    fn skipping_a_step_is_an_invalid_transition_with_context() {
        let f = placed();
        let err = transition(&f.order, TargetStatus::Ready, &f.merchant, Utc::now()).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: "pending".to_string(),
                to: "ready".to_string(),
                allowed: vec!["confirmed".to_string(), "cancelled".to_string()],
            }
        );
    }

    #[test]
    fn courier_has_no_authority_over_merchant_track() {
        let (f, _, courier) = assigned();
        let err = transition(&f.order, TargetStatus::Cancelled, &courier, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn merchant_has_no_authority_over_delivery_track() {
        let (f, _, _) = assigned();
        let err = transition(&f.order, TargetStatus::Accepted, &f.merchant, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn foreign_merchant_is_forbidden() {
        let f = placed();
        let stranger = Principal::merchant(ActorId::new());
        let err = transition(&f.order, TargetStatus::Confirmed, &stranger, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(msg) if msg.contains("does not own")));
    }

    #[test]
    fn unbound_courier_is_forbidden() {
        let (f, _, _) = assigned();
        let other = Principal::courier(ActorId::new());
        let err = transition(&f.order, TargetStatus::Accepted, &other, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn operator_may_cancel_any_order_once() {
        let f = placed();
        let t = transition(&f.order, TargetStatus::Cancelled, &f.operator, Utc::now()).unwrap();
        assert_eq!(t.order.status(), OrderStatus::Cancelled);
        assert_eq!(t.event.kind, OrderEventKind::Cancelled);

        let err = transition(&t.order, TargetStatus::Cancelled, &f.operator, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidTransition { ref allowed, .. } if allowed.is_empty()
        ));
    }

    #[test]
    fn cancelling_a_bound_order_releases_the_courier() {
        let (f, courier, _) = assigned();
        let t = transition(&f.order, TargetStatus::Cancelled, &f.merchant, Utc::now()).unwrap();

        assert_eq!(t.courier_effect, Some(CourierEffect::Release(courier.id_typed())));
        assert_eq!(t.order.bound_courier(), None);
        assert_eq!(t.event.courier_id, Some(courier.id_typed()));
    }

    #[test]
    fn delivery_track_is_blocked_after_cancellation() {
        let (f, _, courier) = assigned();
        // Cancel keeps nothing bound, so even the former courier is now a stranger.
        let cancelled = transition(&f.order, TargetStatus::Cancelled, &f.operator, Utc::now())
            .unwrap()
            .order;
        assert!(transition(&cancelled, TargetStatus::Accepted, &courier, Utc::now()).is_err());
    }

    #[test]
    fn delivered_requires_two_proof_images() {
        let (mut f, _, courier) = assigned();
        for t in [TargetStatus::Accepted, TargetStatus::PickedUp, TargetStatus::InTransit] {
            f.order = transition(&f.order, t, &courier, Utc::now()).unwrap().order;
        }

        let err = transition(&f.order, TargetStatus::Delivered, &courier, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn each_transition_appends_exactly_one_entry() {
        let f = placed();
        let t = transition(&f.order, TargetStatus::Confirmed, &f.merchant, Utc::now()).unwrap();

        assert!(f.order.status_history().is_extended_by_one(t.order.status_history()));
        assert_eq!(t.order.status_history().last(), Some(&t.entry));
        assert_eq!(t.previous_version, f.order.version());
        assert_eq!(t.order.version(), f.order.version() + 1);
    }

    #[test]
    fn legal_next_depends_on_role() {
        let (f, _, _) = assigned();
        assert_eq!(legal_next(&f.order, Role::Courier), vec![TargetStatus::Accepted]);
        assert_eq!(legal_next(&f.order, Role::Merchant), vec![TargetStatus::Cancelled]);
        assert!(legal_next(&f.order, Role::Buyer).is_empty());
    }

    #[test]
    fn target_status_parses_wire_names() {
        assert_eq!("picked_up".parse::<TargetStatus>().unwrap(), TargetStatus::PickedUp);
        assert!("assigned".parse::<TargetStatus>().is_err());
    }

    fn arb_order_status() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    fn arb_delivery_status() -> impl Strategy<Value = Option<DeliveryStatus>> {
        prop::option::of(prop::sample::select(vec![
            D::AwaitingAssignment,
            D::Assigned,
            D::Accepted,
            D::PickedUp,
            D::InTransit,
            D::Delivered,
        ]))
    }

    fn arb_target() -> impl Strategy<Value = TargetStatus> {
        prop::sample::select(TargetStatus::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: display status is a pure function with cancelled, then
        /// delivered, dominating.
        #[test]
        fn display_precedence(status in arb_order_status(), delivery in arb_delivery_status()) {
            let mut order = placed().order;
            order.status = status;
            order.delivery_status = delivery;

            let shown = resolve_display_status(&order);
            prop_assert_eq!(shown, resolve_display_status(&order.clone()));

            if status == OrderStatus::Cancelled {
                prop_assert_eq!(shown, OrderStatus::Cancelled);
            } else if delivery == Some(D::Delivered) || status == OrderStatus::Delivered {
                prop_assert_eq!(shown, OrderStatus::Delivered);
            } else {
                prop_assert_eq!(shown, status);
            }
        }

        /// Property: whatever sequence of requests is thrown at an order, the
        /// history only grows, by one entry per accepted request, and never
        /// rewrites earlier entries.
        #[test]
        fn history_is_append_only(
            requests in prop::collection::vec((arb_target(), 0usize..3), 1..40)
        ) {
            let (f, _, courier) = assigned();
            let actors = [f.merchant, f.operator, courier];
            let mut order = f.order;

            for (target, who) in requests {
                let before = order.status_history().clone();
                match transition(&order, target, &actors[who], Utc::now()) {
                    Ok(t) => {
                        prop_assert!(before.is_extended_by_one(t.order.status_history()));
                        order = t.order;
                    }
                    Err(_) => prop_assert_eq!(&before, order.status_history()),
                }
                prop_assert!(order
                    .status_history()
                    .entries()
                    .windows(2)
                    .all(|w| w[0].at <= w[1].at));
            }
        }
    }
}
