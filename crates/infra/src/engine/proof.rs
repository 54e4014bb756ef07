use chrono::Utc;
use tracing::instrument;

use courierflow_auth::Principal;
use courierflow_core::OrderId;
use courierflow_events::{EventBus, EventEnvelope};
use courierflow_orders::{proof, Order, OrderEvent, ProofImage};

use super::{DispatchError, OrderEngine};
use crate::store::OrderStore;

impl<S, B> OrderEngine<S, B>
where
    S: OrderStore,
    B: EventBus<EventEnvelope<OrderEvent>>,
{
    /// Complete a delivery. The images are checked against the configured
    /// policy before anything is written; a rejected submission leaves the
    /// order exactly as it was.
    #[instrument(skip(self, images), fields(actor = %actor, images = images.len()))]
    pub fn submit_proof(
        &self,
        actor: &Principal,
        order_id: OrderId,
        images: &[ProofImage],
    ) -> Result<Order, DispatchError> {
        self.execute(order_id, actor, |order| {
            proof::complete_delivery(order, images, &self.proof_policy, actor, Utc::now())
        })
    }
}
