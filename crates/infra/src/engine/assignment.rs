use chrono::Utc;
use tracing::{info, instrument};

use courierflow_auth::{authorize, Permission, Principal};
use courierflow_core::{CourierId, OrderId};
use courierflow_events::{EventBus, EventEnvelope};
use courierflow_orders::{assignment, Courier, NewCourier, Order, OrderEvent};

use super::{DispatchError, OrderEngine};
use crate::store::OrderStore;

impl<S, B> OrderEngine<S, B>
where
    S: OrderStore,
    B: EventBus<EventEnvelope<OrderEvent>>,
{
    /// Bind a courier to an order. Of two concurrent attempts on the same
    /// order or the same courier exactly one commits; the other gets
    /// [`DispatchError::Conflict`].
    #[instrument(skip(self), fields(actor = %actor))]
    pub fn assign(
        &self,
        actor: &Principal,
        order_id: OrderId,
        courier_id: CourierId,
    ) -> Result<Order, DispatchError> {
        authorize(actor, Permission::OrdersAssign)?;
        let courier = self.load_courier(courier_id)?;
        self.execute(order_id, actor, |order| {
            assignment::assign(order, &courier, actor, Utc::now())
        })
    }

    /// Bind a replacement courier after a decline.
    #[instrument(skip(self), fields(actor = %actor))]
    pub fn reassign(
        &self,
        actor: &Principal,
        order_id: OrderId,
        courier_id: CourierId,
    ) -> Result<Order, DispatchError> {
        authorize(actor, Permission::OrdersAssign)?;
        let courier = self.load_courier(courier_id)?;
        self.execute(order_id, actor, |order| {
            assignment::reassign(order, &courier, actor, Utc::now())
        })
    }

    #[instrument(skip(self), fields(actor = %actor))]
    pub fn accept(&self, actor: &Principal, order_id: OrderId) -> Result<Order, DispatchError> {
        self.execute(order_id, actor, |order| assignment::accept(order, actor, Utc::now()))
    }

    #[instrument(skip(self), fields(actor = %actor))]
    pub fn decline(&self, actor: &Principal, order_id: OrderId) -> Result<Order, DispatchError> {
        self.execute(order_id, actor, |order| assignment::decline(order, actor, Utc::now()))
    }

    /// Couriers that are active and not bound to any order, by name.
    pub fn available_couriers(&self, actor: &Principal) -> Result<Vec<Courier>, DispatchError> {
        authorize(actor, Permission::CouriersRead)?;
        let mut couriers: Vec<Courier> = self
            .store
            .list_couriers()?
            .into_iter()
            .filter(Courier::can_take_work)
            .collect();
        couriers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(couriers)
    }

    pub fn couriers(&self, actor: &Principal) -> Result<Vec<Courier>, DispatchError> {
        authorize(actor, Permission::CouriersAdmin)?;
        let mut couriers = self.store.list_couriers()?;
        couriers.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(couriers)
    }

    pub fn register_courier(
        &self,
        actor: &Principal,
        new: NewCourier,
    ) -> Result<Courier, DispatchError> {
        authorize(actor, Permission::CouriersAdmin)?;
        let courier = Courier::register(CourierId::new(), new)?;
        self.store.insert_courier(courier.clone())?;
        info!(courier = %courier.id_typed(), name = courier.name(), "courier registered");
        Ok(courier)
    }

    /// Deactivation does not unbind a courier from an in-flight order; it
    /// only keeps them out of new assignments.
    pub fn set_courier_active(
        &self,
        actor: &Principal,
        courier_id: CourierId,
        active: bool,
    ) -> Result<Courier, DispatchError> {
        authorize(actor, Permission::CouriersAdmin)?;
        let courier = self.store.set_courier_active(courier_id, active)?;
        info!(courier = %courier_id, active, "courier activation changed");
        Ok(courier)
    }
}
