use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use courierflow_events::{EventBus, EventEnvelope, Projection, Subscription};

/// Handle to control and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Request graceful shutdown and wait for the worker to stop.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
        info!(worker = self.name, "projection worker stopped");
    }
}

/// Generic projection worker loop.
///
/// - Subscribes to the event bus before returning, so nothing published after
///   `spawn` is missed
/// - Folds every envelope into the projection (which must be idempotent)
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Spawn a worker thread that applies bus envelopes to `projection`.
    pub fn spawn<P, B>(name: &'static str, bus: &B, mut projection: P) -> io::Result<WorkerHandle>
    where
        P: Projection + Send + 'static,
        B: EventBus<EventEnvelope<P::Ev>>,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, &mut projection))?;

        info!(worker = name, "projection worker started");
        Ok(WorkerHandle {
            name,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop<P>(
    name: &'static str,
    sub: Subscription<EventEnvelope<P::Ev>>,
    shutdown_rx: mpsc::Receiver<()>,
    projection: &mut P,
) where
    P: Projection,
{
    let tick = Duration::from_millis(250);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(envelope) => {
                projection.apply(&envelope);
                debug!(
                    worker = name,
                    order_id = %envelope.order_id(),
                    sequence = envelope.sequence_number(),
                    "envelope applied"
                );
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
