//! Integration tests for the full order pipeline.
//!
//! Tests: Engine → OrderStore → fan-out → EventBus → ProjectionWorker → stats
//!
//! Verifies:
//! - A delivery from checkout to proof updates mailboxes and courier stats
//! - A failed commit leaves no state change, notification or published event
//! - Mark-all-read only covers what arrived before the call

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use courierflow_core::{CourierId, OrderId};
    use courierflow_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use courierflow_notifications::Recipient;
    use courierflow_orders::{
        Courier, DeliveryStatus, Order, OrderEvent, OrderStatus, ProofImage, ProofPolicy,
        TargetStatus, Transition,
    };

    use crate::engine::{DispatchError, OrderEngine};
    use crate::notifications::{InMemoryMailbox, Mailbox, NotificationFanout};
    use crate::projections::CourierStatsProjection;
    use crate::query::{OrderQueries, OrderQuery};
    use crate::store::{InMemoryOrderStore, OrderStore, StoreError};
    use crate::test_support::{courier_principal, new_courier, new_order, Actors};
    use crate::workers::ProjectionWorker;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<OrderEvent>>>;

    /// Delegates to the in-memory store; commits fail while `failing` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryOrderStore,
        failing: AtomicBool,
    }

    impl OrderStore for FlakyStore {
        fn insert_order(&self, order: Order) -> Result<(), StoreError> {
            self.inner.insert_order(order)
        }

        fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
            self.inner.get_order(id)
        }

        fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
            self.inner.list_orders()
        }

        fn commit(&self, transition: &Transition) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.commit(transition)
        }

        fn insert_courier(&self, courier: Courier) -> Result<(), StoreError> {
            self.inner.insert_courier(courier)
        }

        fn get_courier(&self, id: CourierId) -> Result<Option<Courier>, StoreError> {
            self.inner.get_courier(id)
        }

        fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
            self.inner.list_couriers()
        }

        fn set_courier_active(&self, id: CourierId, active: bool) -> Result<Courier, StoreError> {
            self.inner.set_courier_active(id, active)
        }
    }

    fn setup<S: OrderStore>(store: S) -> (OrderEngine<S, Bus>, Bus, Arc<InMemoryMailbox>) {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let mailbox = Arc::new(InMemoryMailbox::new());
        let engine = OrderEngine::new(store, bus.clone(), ProofPolicy::default())
            .with_handler(Arc::new(NotificationFanout::new(mailbox.clone())));
        (engine, bus, mailbox)
    }

    fn proof() -> Vec<ProofImage> {
        ["pod/door.jpg", "pod/parcel.jpg"]
            .into_iter()
            .map(|reference| ProofImage {
                reference: reference.to_string(),
                mime_type: "image/jpeg".to_string(),
                size_bytes: 240_000,
            })
            .collect()
    }

    fn wait_until(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[tokio::test]
    async fn checkout_to_proof_with_a_declined_first_courier() {
        let (engine, bus, mailbox) = setup(Arc::new(InMemoryOrderStore::new()));
        let stats = CourierStatsProjection::new(500);
        let worker = ProjectionWorker::spawn("courier-stats", &bus, stats.clone()).unwrap();
        let actors = Actors::new();

        let c1 = engine.register_courier(&actors.operator, new_courier("Grace")).unwrap();
        let c2 = engine.register_courier(&actors.operator, new_courier("Linus")).unwrap();
        let (rider1, rider2) = (courier_principal(&c1), courier_principal(&c2));

        let order = engine
            .create_order(
                &actors.buyer,
                new_order(actors.merchant_id(), "Ada Lovelace", "Flat white"),
                None,
            )
            .await
            .unwrap();
        let id = order.id_typed();
        let merchant = Recipient::Merchant(actors.merchant_id());
        assert_eq!(mailbox.unread_count(merchant).unwrap(), 1);

        for target in [TargetStatus::Confirmed, TargetStatus::Preparing, TargetStatus::Ready] {
            engine.transition(&actors.merchant, id, target).unwrap();
        }
        engine.assign(&actors.merchant, id, c1.id_typed()).unwrap();
        assert_eq!(
            mailbox.unread_count(Recipient::Courier(c1.id_typed())).unwrap(),
            1
        );

        engine.decline(&rider1, id).unwrap();
        engine.reassign(&actors.operator, id, c2.id_typed()).unwrap();
        for target in [TargetStatus::Accepted, TargetStatus::PickedUp, TargetStatus::InTransit] {
            engine.transition(&rider2, id, target).unwrap();
        }
        let delivered = engine.submit_proof(&rider2, id, &proof()).unwrap();

        assert_eq!(delivered.status(), OrderStatus::Delivered);
        assert_eq!(delivered.delivery_status(), Some(DeliveryStatus::Delivered));
        // placed, 3 merchant steps, assigned, awaiting, assigned, 3 courier steps, delivered
        assert_eq!(delivered.status_history().len(), 11);
        assert!(engine.available_couriers(&actors.operator).unwrap().len() == 2);

        // The courier who declined can no longer see the order.
        let queries = OrderQueries::new(engine.store().clone(), 50);
        assert_eq!(queries.query(&rider1, &OrderQuery::default()).unwrap().total_count, 0);
        assert_eq!(queries.query(&rider2, &OrderQuery::default()).unwrap().total_count, 1);

        wait_until(|| stats.get(c2.id_typed()).is_some_and(|s| s.completed == 1));
        worker.shutdown();

        let s1 = stats.get(c1.id_typed()).unwrap();
        let s2 = stats.get(c2.id_typed()).unwrap();
        assert_eq!((s1.assigned, s1.declined, s1.completed), (1, 1, 0));
        assert_eq!((s2.assigned, s2.accepted, s2.completed, s2.earnings), (1, 1, 1, 500));
    }

    #[test]
    fn failed_commit_leaves_no_trace() {
        let store = Arc::new(FlakyStore::default());
        let (engine, bus, mailbox) = setup(store.clone());
        let sub = bus.subscribe();
        let actors = Actors::new();

        let order = Order::place(
            OrderId::new(),
            new_order(actors.merchant_id(), "Ada Lovelace", "Flat white"),
            &actors.buyer,
            chrono::Utc::now(),
        )
        .unwrap();
        store.insert_order(order.clone()).unwrap();
        store.failing.store(true, Ordering::SeqCst);

        let err = engine
            .transition(&actors.merchant, order.id_typed(), TargetStatus::Confirmed)
            .unwrap_err();

        assert!(matches!(err, DispatchError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.get_order(order.id_typed()).unwrap().unwrap(), order);
        assert_eq!(mailbox.unread_count(Recipient::Buyer(order.buyer_id())).unwrap(), 0);
        assert!(sub.try_recv().is_err());

        store.failing.store(false, Ordering::SeqCst);
        engine
            .transition(&actors.merchant, order.id_typed(), TargetStatus::Confirmed)
            .unwrap();
        assert_eq!(mailbox.unread_count(Recipient::Buyer(order.buyer_id())).unwrap(), 1);
        assert!(sub.try_recv().is_ok());
    }

    #[tokio::test]
    async fn mark_all_read_cutoff_through_the_engine() {
        let (engine, _, mailbox) = setup(Arc::new(InMemoryOrderStore::new()));
        let actors = Actors::new();
        let operators = Recipient::Operators;

        for _ in 0..2 {
            engine
                .create_order(&actors.buyer, new_order(actors.merchant_id(), "Ada", "Tea"), None)
                .await
                .unwrap();
        }
        assert_eq!(mailbox.unread_count(operators).unwrap(), 2);
        assert_eq!(mailbox.mark_all_read(operators).unwrap(), 2);

        engine
            .create_order(&actors.buyer, new_order(actors.merchant_id(), "Ada", "Tea"), None)
            .await
            .unwrap();

        assert_eq!(mailbox.unread_count(operators).unwrap(), 1);
        assert_eq!(mailbox.list(operators, 10, 0).unwrap().len(), 3);
    }

    #[test]
    fn cancelling_a_bound_order_frees_and_notifies_the_courier() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (engine, _, mailbox) = setup(store.clone());
        let actors = Actors::new();
        let order = crate::test_support::ready_order(&store, &actors);
        let c1 = engine.register_courier(&actors.operator, new_courier("Grace")).unwrap();
        engine.assign(&actors.merchant, order.id_typed(), c1.id_typed()).unwrap();

        let cancelled = engine
            .transition(&actors.merchant, order.id_typed(), TargetStatus::Cancelled)
            .unwrap();

        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert!(store.get_courier(c1.id_typed()).unwrap().unwrap().can_take_work());
        // assigned + cancelled
        assert_eq!(mailbox.unread_count(Recipient::Courier(c1.id_typed())).unwrap(), 2);
    }
}
