use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use courierflow_core::{AggregateRoot, CourierId, DomainError, OrderId};
use courierflow_orders::{Courier, CourierEffect, Order, Transition};

use super::r#trait::{OrderStore, StoreError};

#[derive(Debug, Default)]
struct State {
    orders: HashMap<OrderId, Order>,
    couriers: HashMap<CourierId, Courier>,
}

/// In-memory order store.
///
/// Intended for tests/dev. A single lock covers orders and couriers, so a
/// commit is one critical section; nothing is held between calls.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    state: RwLock<State>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let id = order.id_typed();
        if state.orders.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("order {id}")));
        }
        state.orders.insert(id, order);
        Ok(())
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.read()?.orders.values().cloned().collect())
    }

    fn commit(&self, transition: &Transition) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let State { orders, couriers } = &mut *guard;

        let next = &transition.order;
        let id = next.id_typed();
        let stored = orders
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;

        if stored.version() != transition.previous_version {
            return Err(StoreError::Concurrency(format!(
                "order {} is at version {}, decision was taken at {}",
                stored.order_number(),
                stored.version(),
                transition.previous_version
            )));
        }
        if next.version() != stored.version() + 1 {
            return Err(StoreError::InvalidCommit(format!(
                "version must advance by one (stored={}, next={})",
                stored.version(),
                next.version()
            )));
        }
        if !stored.status_history().is_extended_by_one(next.status_history()) {
            return Err(StoreError::InvalidCommit(
                "status history must be the stored history plus one entry".to_string(),
            ));
        }

        match transition.courier_effect {
            Some(CourierEffect::Bind(courier_id)) => {
                if let Some(current) = stored.bound_courier() {
                    return Err(StoreError::Concurrency(format!(
                        "order {} already has courier {current} bound",
                        stored.order_number()
                    )));
                }
                let courier = couriers
                    .get_mut(&courier_id)
                    .ok_or_else(|| StoreError::NotFound(format!("courier {courier_id}")))?;
                // Last fallible step: nothing has been written yet if it fails.
                courier.mark_bound().map_err(|e| match e {
                    DomainError::Validation(msg) => StoreError::CourierInactive(msg),
                    other => StoreError::Concurrency(other.to_string()),
                })?;
            }
            Some(CourierEffect::Release(courier_id)) => {
                if let Some(courier) = couriers.get_mut(&courier_id) {
                    courier.mark_released();
                }
            }
            None => {}
        }

        orders.insert(id, next.clone());
        Ok(())
    }

    fn insert_courier(&self, courier: Courier) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let id = courier.id_typed();
        if state.couriers.contains_key(&id) {
            return Err(StoreError::Duplicate(format!("courier {id}")));
        }
        state.couriers.insert(id, courier);
        Ok(())
    }

    fn get_courier(&self, id: CourierId) -> Result<Option<Courier>, StoreError> {
        Ok(self.read()?.couriers.get(&id).cloned())
    }

    fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        let mut couriers: Vec<Courier> = self.read()?.couriers.values().cloned().collect();
        couriers.sort_by_key(|c| c.id_typed());
        Ok(couriers)
    }

    fn set_courier_active(&self, id: CourierId, active: bool) -> Result<Courier, StoreError> {
        let mut state = self.write()?;
        let courier = state
            .couriers
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("courier {id}")))?;
        courier.set_active(active);
        Ok(courier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{courier, ready_order, Actors};
    use chrono::Utc;
    use courierflow_orders::assignment;

    #[test]
    fn bind_commit_flips_courier_availability() {
        let store = InMemoryOrderStore::new();
        let actors = Actors::new();
        let order = ready_order(&store, &actors);
        let c1 = courier(&store, "Grace");

        let t = assignment::assign(&order, &c1, &actors.merchant, Utc::now()).unwrap();
        store.commit(&t).unwrap();

        assert!(!store.get_courier(c1.id_typed()).unwrap().unwrap().is_available());
        assert_eq!(
            store.get_order(order.id_typed()).unwrap().unwrap().bound_courier(),
            Some(c1.id_typed())
        );
    }

    #[test]
    fn stale_decision_is_rejected_and_leaves_state_untouched() {
        let store = InMemoryOrderStore::new();
        let actors = Actors::new();
        let order = ready_order(&store, &actors);
        let c1 = courier(&store, "Grace");
        let c2 = courier(&store, "Linus");

        // Both decisions read the same version.
        let first = assignment::assign(&order, &c1, &actors.merchant, Utc::now()).unwrap();
        let second = assignment::assign(&order, &c2, &actors.operator, Utc::now()).unwrap();

        store.commit(&first).unwrap();
        assert!(matches!(store.commit(&second), Err(StoreError::Concurrency(_))));
        assert!(store.get_courier(c2.id_typed()).unwrap().unwrap().is_available());
    }

    #[test]
    fn one_courier_cannot_be_bound_to_two_orders() {
        let store = InMemoryOrderStore::new();
        let actors = Actors::new();
        let o1 = ready_order(&store, &actors);
        let o2 = ready_order(&store, &actors);
        let c1 = courier(&store, "Grace");

        let t1 = assignment::assign(&o1, &c1, &actors.merchant, Utc::now()).unwrap();
        let t2 = assignment::assign(&o2, &c1, &actors.merchant, Utc::now()).unwrap();

        store.commit(&t1).unwrap();
        assert!(matches!(store.commit(&t2), Err(StoreError::Concurrency(_))));
        assert_eq!(store.get_order(o2.id_typed()).unwrap().unwrap().bound_courier(), None);
    }

    #[test]
    fn courier_deactivated_after_read_fails_the_bind() {
        let store = InMemoryOrderStore::new();
        let actors = Actors::new();
        let order = ready_order(&store, &actors);
        let c1 = courier(&store, "Grace");

        let t = assignment::assign(&order, &c1, &actors.merchant, Utc::now()).unwrap();
        store.set_courier_active(c1.id_typed(), false).unwrap();

        assert!(matches!(store.commit(&t), Err(StoreError::CourierInactive(_))));
        assert_eq!(store.get_order(order.id_typed()).unwrap().unwrap(), order);
    }

    #[test]
    fn commit_must_append_exactly_one_history_entry() {
        let store = InMemoryOrderStore::new();
        let actors = Actors::new();
        let order = ready_order(&store, &actors);
        let c1 = courier(&store, "Grace");

        let mut forged = assignment::assign(&order, &c1, &actors.merchant, Utc::now()).unwrap();
        forged.order = order.clone();

        assert!(matches!(store.commit(&forged), Err(StoreError::InvalidCommit(_))));
        assert!(store.get_courier(c1.id_typed()).unwrap().unwrap().is_available());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let store = InMemoryOrderStore::new();
        let c1 = courier(&store, "Grace");
        assert!(matches!(store.insert_courier(c1), Err(StoreError::Duplicate(_))));
    }
}
