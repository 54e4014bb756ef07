use std::{convert::Infallible, io, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::Utc;
use tokio_stream::{wrappers::WatchStream, StreamExt};

use courierflow_auth::{authorize, Permission, Principal};
use courierflow_events::{EventEnvelope, InMemoryEventBus};
use courierflow_infra::{
    config::EngineConfig,
    engine::{DispatchError, OrderEngine},
    external::{ReportSnapshot, RouteProvider},
    notifications::{InMemoryMailbox, NotificationFanout},
    poller::{LoadState, UnreadCountPoller},
    projections::CourierStatsProjection,
    query::{OrderQueries, OrderView},
    store::{InMemoryOrderStore, OrderStore},
    workers::{ProjectionWorker, WorkerHandle},
};
use courierflow_notifications::Recipient;
use courierflow_orders::OrderEvent;

pub type Store = Arc<InMemoryOrderStore>;
pub type Bus = Arc<InMemoryEventBus<EventEnvelope<OrderEvent>>>;
pub type Engine = OrderEngine<Store, Bus>;

/// Everything a request handler needs, wired once per process.
pub struct AppServices {
    pub engine: Engine,
    pub queries: OrderQueries<Store>,
    pub mailbox: Arc<InMemoryMailbox>,
    pub stats: CourierStatsProjection,
    pub routes: Option<Arc<dyn RouteProvider>>,
    pub poll_interval: Duration,
    /// Stops with the bus when the services are dropped.
    _stats_worker: WorkerHandle,
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("engine", &self.engine)
            .field("route_provider", &self.routes.is_some())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

/// Wire the in-memory stack: store, bus, notification fan-out and the
/// courier statistics worker.
pub fn build_services(config: &EngineConfig) -> io::Result<AppServices> {
    let store: Store = Arc::new(InMemoryOrderStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    let mailbox = Arc::new(InMemoryMailbox::new());

    let stats = CourierStatsProjection::new(config.courier_fee_per_delivery);
    let stats_worker = ProjectionWorker::spawn("courier-stats", &bus, stats.clone())?;

    let engine = OrderEngine::new(store.clone(), bus, config.proof_policy.clone())
        .with_handler(Arc::new(NotificationFanout::new(mailbox.clone())));
    let queries = OrderQueries::new(store, config.max_page_size);

    tracing::info!(
        max_page_size = config.max_page_size,
        fee = config.courier_fee_per_delivery,
        "services wired"
    );

    Ok(AppServices {
        engine,
        queries,
        mailbox,
        stats,
        routes: None,
        poll_interval: config.notification_poll_interval,
        _stats_worker: stats_worker,
    })
}

impl AppServices {
    pub fn with_route_provider(mut self, provider: Arc<dyn RouteProvider>) -> Self {
        self.routes = Some(provider);
        self
    }

    /// Read-only snapshot for exports. Never writes back.
    pub fn report_snapshot(&self, principal: &Principal) -> Result<ReportSnapshot, DispatchError> {
        authorize(principal, Permission::ReportsRead)?;
        let mut orders: Vec<OrderView> = self
            .engine
            .store()
            .list_orders()?
            .into_iter()
            .map(OrderView::from)
            .collect();
        orders.sort_by(|a, b| b.order.created_at().cmp(&a.order.created_at()));

        Ok(ReportSnapshot {
            generated_at: Utc::now(),
            orders,
            statistics: self.stats.all(),
        })
    }
}

/// Server-sent unread counts for the caller's mailbox.
///
/// Each connection owns a poller; it stops when the client goes away.
pub fn unread_count_sse_stream(
    services: Arc<AppServices>,
    recipient: Recipient,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let poller = UnreadCountPoller::start(services.mailbox.clone(), recipient, services.poll_interval);
    let rx = poller.subscribe();

    let stream = WatchStream::new(rx).filter_map(move |state| {
        let _poller = &poller;
        match state {
            LoadState::Loaded(count) => Some(Ok(SseEvent::default()
                .event("notifications.unread_count")
                .data(serde_json::json!({ "count": count }).to_string()))),
            _ => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
