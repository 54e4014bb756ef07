//! Order engine: application-level orchestration of every order change.
//!
//! ```text
//! request (principal, order id, intent)
//!   ↓
//! 1. Reload the order from the store (client state is never trusted)
//!   ↓
//! 2. Decide (pure domain function → Transition)
//!   ↓
//! 3. Commit atomically (order + audit entry + courier flag, version CAS)
//!   ↓
//! 4. Fan out to in-process handlers (notifications)
//!   ↓
//! 5. Publish to the bus (projections, workers)
//! ```
//!
//! Nothing after step 3 can undo a commit: handler and bus failures are
//! logged. Nothing before it has side effects, so a failed decision or commit
//! leaves no trace and emits no notification.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use courierflow_auth::{AuthzError, Principal};
use courierflow_core::{AggregateRoot, CourierId, DomainError, OrderId};
use courierflow_events::{EventBus, EventEnvelope, EventHandler};
use courierflow_orders::{Courier, Order, OrderEvent, ProofPolicy, Transition};

use crate::external::{BiometricVerifier, ExternalError};
use crate::notifications::MailboxError;
use crate::query::is_visible;
use crate::store::{OrderStore, StoreError};

pub mod assignment;
pub mod lifecycle;
pub mod proof;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Lost a race; re-fetch and retry against fresh state.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("invalid identifier: {0}")]
    InvalidId(String),
    #[error("not found")]
    NotFound,
    #[error("external collaborator failed: {0}")]
    External(String),
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvalidTransition { from, to, allowed } => {
                DispatchError::InvalidTransition { from, to, allowed }
            }
            DomainError::Forbidden(msg) => DispatchError::Forbidden(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::InvalidId(msg) => DispatchError::InvalidId(msg),
            DomainError::NotFound => DispatchError::NotFound,
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => DispatchError::Conflict(msg),
            StoreError::CourierInactive(msg) => DispatchError::Validation(msg),
            StoreError::NotFound(_) => DispatchError::NotFound,
            other => DispatchError::Store(other),
        }
    }
}

impl From<MailboxError> for DispatchError {
    fn from(value: MailboxError) -> Self {
        match value {
            MailboxError::NotFound => DispatchError::NotFound,
            MailboxError::Unavailable(msg) => DispatchError::Store(StoreError::Unavailable(msg)),
        }
    }
}

impl From<ExternalError> for DispatchError {
    fn from(value: ExternalError) -> Self {
        DispatchError::External(value.to_string())
    }
}

impl From<AuthzError> for DispatchError {
    fn from(value: AuthzError) -> Self {
        DispatchError::Forbidden(value.to_string())
    }
}

/// Entry point for every order and courier change.
///
/// - `S`: order store (atomic commit with courier compare-and-set)
/// - `B`: event bus for committed events
pub struct OrderEngine<S, B> {
    store: S,
    bus: B,
    handlers: Vec<Arc<dyn EventHandler<OrderEvent>>>,
    proof_policy: ProofPolicy,
    biometric: Option<Arc<dyn BiometricVerifier>>,
}

impl<S, B> core::fmt::Debug for OrderEngine<S, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OrderEngine")
            .field("handlers", &self.handlers.len())
            .field("proof_policy", &self.proof_policy)
            .field("biometric_gate", &self.biometric.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, B> OrderEngine<S, B> {
    pub fn new(store: S, bus: B, proof_policy: ProofPolicy) -> Self {
        Self {
            store,
            bus,
            handlers: Vec::new(),
            proof_policy,
            biometric: None,
        }
    }

    /// Register a handler run synchronously after each commit.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler<OrderEvent>>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Require a matching biometric descriptor at checkout.
    pub fn with_biometric_verifier(mut self, verifier: Arc<dyn BiometricVerifier>) -> Self {
        self.biometric = Some(verifier);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn proof_policy(&self) -> &ProofPolicy {
        &self.proof_policy
    }
}

impl<S, B> OrderEngine<S, B>
where
    S: OrderStore,
    B: EventBus<EventEnvelope<OrderEvent>>,
{
    pub(crate) fn load_order(&self, order_id: OrderId) -> Result<Order, DispatchError> {
        self.store.get_order(order_id)?.ok_or(DispatchError::NotFound)
    }

    pub(crate) fn load_courier(&self, courier_id: CourierId) -> Result<Courier, DispatchError> {
        self.store.get_courier(courier_id)?.ok_or(DispatchError::NotFound)
    }

    /// Load an order the principal is allowed to read.
    pub(crate) fn load_visible(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<Order, DispatchError> {
        let order = self.load_order(order_id)?;
        if !is_visible(&order, principal) {
            warn!(principal = %principal, order = %order.order_number(), "order outside caller scope");
            return Err(DispatchError::Forbidden(format!(
                "order {} is outside your scope",
                order.order_number()
            )));
        }
        Ok(order)
    }

    /// Reload, decide, commit, fan out, publish.
    pub(crate) fn execute(
        &self,
        order_id: OrderId,
        actor: &Principal,
        decide: impl FnOnce(&Order) -> Result<Transition, DomainError>,
    ) -> Result<Order, DispatchError> {
        let result = self
            .load_order(order_id)
            .and_then(|current| decide(&current).map_err(DispatchError::from))
            .and_then(|transition| {
                self.store.commit(&transition)?;
                Ok(transition)
            });

        match result {
            Ok(transition) => {
                info!(
                    order = %transition.order.order_number(),
                    event = transition.event.kind.as_str(),
                    version = transition.order.version(),
                    actor = %actor,
                    "order change committed"
                );
                let version = transition.order.version();
                self.emit(transition.event, version);
                Ok(transition.order)
            }
            Err(err) => {
                match &err {
                    DispatchError::Forbidden(msg) => {
                        warn!(actor = %actor, order_id = %order_id, reason = %msg, "forbidden order change")
                    }
                    DispatchError::Conflict(msg) => {
                        warn!(actor = %actor, order_id = %order_id, reason = %msg, "order change lost a race")
                    }
                    _ => {}
                }
                Err(err)
            }
        }
    }

    pub(crate) fn emit(&self, event: OrderEvent, sequence_number: u64) {
        let envelope = EventEnvelope::new(Uuid::now_v7(), event.order_id, sequence_number, event);

        for handler in &self.handlers {
            handler.handle(&envelope);
        }

        if let Err(err) = self.bus.publish(envelope) {
            warn!(error = ?err, "failed to publish committed order event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryOrderStore;
    use courierflow_events::InMemoryEventBus;

    #[test]
    fn store_errors_map_to_caller_facing_categories() {
        assert!(matches!(
            DispatchError::from(StoreError::Concurrency("x".into())),
            DispatchError::Conflict(_)
        ));
        assert!(matches!(
            DispatchError::from(StoreError::CourierInactive("x".into())),
            DispatchError::Validation(_)
        ));
        assert!(matches!(
            DispatchError::from(StoreError::Unavailable("x".into())),
            DispatchError::Store(_)
        ));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let engine = OrderEngine::new(
            InMemoryOrderStore::new(),
            InMemoryEventBus::<EventEnvelope<OrderEvent>>::new(),
            ProofPolicy::default(),
        );
        assert_eq!(engine.load_order(OrderId::new()), Err(DispatchError::NotFound));
    }
}
