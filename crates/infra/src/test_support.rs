//! Shared fixtures for infra tests.

use chrono::Utc;

use courierflow_auth::Principal;
use courierflow_core::{ActorId, CourierId, MerchantId, OrderId};
use courierflow_orders::{
    transition, Courier, LineItem, NewCourier, NewOrder, Order, TargetStatus, Vehicle,
};

use crate::store::OrderStore;

pub(crate) struct Actors {
    pub merchant: Principal,
    pub operator: Principal,
    pub buyer: Principal,
}

impl Actors {
    pub fn new() -> Self {
        Self {
            merchant: Principal::merchant(ActorId::new()),
            operator: Principal::operator(ActorId::new()),
            buyer: Principal::buyer(ActorId::new()),
        }
    }

    pub fn merchant_id(&self) -> MerchantId {
        MerchantId::from(self.merchant.actor_id)
    }
}

pub(crate) fn new_order(merchant_id: MerchantId, buyer_name: &str, item: &str) -> NewOrder {
    NewOrder {
        merchant_id,
        buyer_name: buyer_name.to_string(),
        items: vec![LineItem {
            name: item.to_string(),
            quantity: 2,
            unit_price: 450,
        }],
        proof_of_payment: None,
    }
}

pub(crate) fn new_courier(name: &str) -> NewCourier {
    NewCourier {
        name: name.to_string(),
        phone: "+31 20 555 0199".to_string(),
        vehicle: Vehicle {
            kind: "bicycle".to_string(),
            plate: "CARGO-7".to_string(),
        },
        photo: None,
    }
}

/// Register an active, available courier directly in the store.
pub(crate) fn courier(store: &impl OrderStore, name: &str) -> Courier {
    let courier = Courier::register(CourierId::new(), new_courier(name)).unwrap();
    store.insert_courier(courier.clone()).unwrap();
    courier
}

pub(crate) fn courier_principal(courier: &Courier) -> Principal {
    Principal::courier(ActorId::from(courier.id_typed()))
}

/// Place an order and walk it to `ready`, committing every step.
pub(crate) fn ready_order(store: &impl OrderStore, actors: &Actors) -> Order {
    let mut order = Order::place(
        OrderId::new(),
        new_order(actors.merchant_id(), "Ada Lovelace", "Flat white"),
        &actors.buyer,
        Utc::now(),
    )
    .unwrap();
    store.insert_order(order.clone()).unwrap();

    for target in [TargetStatus::Confirmed, TargetStatus::Preparing, TargetStatus::Ready] {
        let t = transition(&order, target, &actors.merchant, Utc::now()).unwrap();
        store.commit(&t).unwrap();
        order = t.order;
    }
    order
}
