//! Assignment decisions: binding couriers to orders, accept and decline.
//!
//! These functions only decide. The courier availability flip travels in
//! [`Transition::courier_effect`] and is applied by the store in the same
//! atomic commit as the order, which is where the race between two assigners
//! is settled.

use chrono::{DateTime, Utc};

use courierflow_auth::{Principal, Role};
use courierflow_core::DomainError;

use crate::courier::Courier;
use crate::events::OrderEventKind;
use crate::history::TrackedStatus;
use crate::order::{DeliveryStatus, Order, OrderStatus};
use crate::transitions::{
    ensure_owner, invalid_transition, seal, transition, CourierEffect, TargetStatus, Track,
    Transition,
};

/// Merchant-facing statuses in which an order may be handed to a courier.
const ASSIGNABLE: &[OrderStatus] = &[
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
];

/// Bind `courier` to an order that has never been assigned or whose courier
/// declined.
pub fn assign(
    order: &Order,
    courier: &Courier,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    ensure_assigner(order, actor)?;
    ensure_unbound(order)?;
    match order.delivery_status {
        None | Some(DeliveryStatus::AwaitingAssignment) => {}
        Some(_) => {
            return Err(invalid_transition(order, Track::Delivery, "assigned", actor.role));
        }
    }
    bind(order, courier, actor, now)
}

/// Bind a new courier after a decline.
///
/// An order that was never assigned goes through [`assign`] instead.
pub fn reassign(
    order: &Order,
    courier: &Courier,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    ensure_assigner(order, actor)?;
    ensure_unbound(order)?;
    if order.delivery_status != Some(DeliveryStatus::AwaitingAssignment) {
        return Err(invalid_transition(order, Track::Delivery, "assigned", actor.role));
    }
    bind(order, courier, actor, now)
}

/// The bound courier takes the job.
pub fn accept(order: &Order, actor: &Principal, now: DateTime<Utc>) -> Result<Transition, DomainError> {
    transition(order, TargetStatus::Accepted, actor, now)
}

/// The bound courier turns the job down. The binding is cleared and the
/// courier released; the order waits in `awaiting_assignment`.
pub fn decline(order: &Order, actor: &Principal, now: DateTime<Utc>) -> Result<Transition, DomainError> {
    if actor.role != Role::Courier {
        return Err(DomainError::forbidden("only the assigned courier may decline"));
    }
    ensure_owner(order, actor)?;

    let courier_id = match (order.delivery_status, order.bound_courier()) {
        (Some(DeliveryStatus::Assigned), Some(courier_id)) => courier_id,
        _ => {
            return Err(invalid_transition(
                order,
                Track::Delivery,
                DeliveryStatus::AwaitingAssignment.as_str(),
                actor.role,
            ));
        }
    };

    let mut next = order.clone();
    next.courier_assignment = None;
    next.delivery_status = Some(DeliveryStatus::AwaitingAssignment);

    Ok(seal(
        next,
        order,
        TrackedStatus::Delivery(DeliveryStatus::AwaitingAssignment),
        OrderEventKind::Declined,
        Some(courier_id),
        Some(CourierEffect::Release(courier_id)),
        actor,
        now,
    ))
}

fn ensure_assigner(order: &Order, actor: &Principal) -> Result<(), DomainError> {
    match actor.role {
        Role::Merchant | Role::Operator => ensure_owner(order, actor),
        _ => Err(DomainError::forbidden(format!(
            "role '{}' may not assign couriers",
            actor.role
        ))),
    }
}

fn ensure_unbound(order: &Order) -> Result<(), DomainError> {
    match order.bound_courier() {
        Some(current) => Err(DomainError::conflict(format!(
            "order {} already has courier {current} bound",
            order.order_number
        ))),
        None => Ok(()),
    }
}

fn bind(
    order: &Order,
    courier: &Courier,
    actor: &Principal,
    now: DateTime<Utc>,
) -> Result<Transition, DomainError> {
    if !ASSIGNABLE.contains(&order.status) {
        return Err(invalid_transition(order, Track::Merchant, "assigned", actor.role));
    }
    courier.ensure_bindable()?;

    let courier_id = courier.id_typed();
    let mut next = order.clone();
    next.courier_assignment = Some(courier.snapshot(now));
    next.delivery_status = Some(DeliveryStatus::Assigned);

    Ok(seal(
        next,
        order,
        TrackedStatus::Delivery(DeliveryStatus::Assigned),
        OrderEventKind::Assigned,
        Some(courier_id),
        Some(CourierEffect::Bind(courier_id)),
        actor,
        now,
    ))
}
