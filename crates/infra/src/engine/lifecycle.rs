use chrono::Utc;
use tracing::{info, instrument, warn};

use courierflow_auth::{Principal, Role};
use courierflow_core::{AggregateRoot, DomainError, OrderId};
use courierflow_events::{EventBus, EventEnvelope};
use courierflow_orders::{
    transition, NewOrder, Order, OrderEvent, OrderEventKind, StatusHistory, TargetStatus,
};

use super::{DispatchError, OrderEngine};
use crate::store::OrderStore;

impl<S, B> OrderEngine<S, B>
where
    S: OrderStore,
    B: EventBus<EventEnvelope<OrderEvent>>,
{
    /// Buyer checkout. When a biometric verifier is configured the buyer must
    /// present a matching descriptor.
    #[instrument(skip(self, new, descriptor), fields(buyer = %buyer.actor_id))]
    pub async fn create_order(
        &self,
        buyer: &Principal,
        new: NewOrder,
        descriptor: Option<&[f32]>,
    ) -> Result<Order, DispatchError> {
        if buyer.role != Role::Buyer {
            return Err(DispatchError::Forbidden("only buyers place orders".to_string()));
        }

        if let Some(verifier) = &self.biometric {
            let descriptor = descriptor
                .filter(|d| !d.is_empty())
                .ok_or_else(|| DomainError::validation("a biometric descriptor is required at checkout"))?;
            let verification = verifier.verify(buyer.actor_id, descriptor).await?;
            if !verification.is_match {
                warn!("biometric verification did not match");
                return Err(DispatchError::Forbidden(
                    "biometric verification failed".to_string(),
                ));
            }
        }

        let order = Order::place(OrderId::new(), new, buyer, Utc::now())?;
        self.store.insert_order(order.clone())?;

        info!(
            order = %order.order_number(),
            merchant = %order.merchant_id(),
            total = order.total_amount(),
            "order created"
        );
        let event = OrderEvent::for_order(
            OrderEventKind::Created,
            &order,
            None,
            *buyer,
            order.created_at(),
        );
        self.emit(event, order.version());
        Ok(order)
    }

    /// Request a status change on either track.
    #[instrument(skip(self), fields(actor = %actor))]
    pub fn transition(
        &self,
        actor: &Principal,
        order_id: OrderId,
        target: TargetStatus,
    ) -> Result<Order, DispatchError> {
        self.execute(order_id, actor, |order| {
            transition(order, target, actor, Utc::now())
        })
    }

    pub fn get_order(&self, principal: &Principal, order_id: OrderId) -> Result<Order, DispatchError> {
        self.load_visible(principal, order_id)
    }

    pub fn history(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<StatusHistory, DispatchError> {
        Ok(self.load_visible(principal, order_id)?.status_history().clone())
    }
}
