//! Unread-count polling for notification badges.
//!
//! A fixed-interval tokio task reads the unread count for one mailbox and
//! publishes an explicit [`LoadState`] on a watch channel. Transient failures
//! are logged and retried on the next tick; only [`UnreadCountPoller::refresh_now`]
//! hands the error back to its caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use courierflow_notifications::Recipient;

use crate::notifications::{Mailbox, MailboxError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded(usize),
    Error(String),
}

/// Where the poller reads counts from.
#[async_trait]
pub trait UnreadCountSource: Send + Sync {
    async fn fetch_unread_count(&self, recipient: Recipient) -> Result<usize, MailboxError>;
}

#[async_trait]
impl<M> UnreadCountSource for M
where
    M: Mailbox,
{
    async fn fetch_unread_count(&self, recipient: Recipient) -> Result<usize, MailboxError> {
        self.unread_count(recipient)
    }
}

/// Periodic unread-count poller for one recipient.
///
/// Dropping the poller stops its task.
#[derive(Debug)]
pub struct UnreadCountPoller {
    recipient: Recipient,
    source: Arc<dyn UnreadCountSource>,
    state: Arc<watch::Sender<LoadState>>,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for dyn UnreadCountSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("UnreadCountSource")
    }
}

impl UnreadCountPoller {
    /// Spawn the polling task on the current tokio runtime. The first poll
    /// happens immediately.
    pub fn start(
        source: Arc<dyn UnreadCountSource>,
        recipient: Recipient,
        interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        let state = Arc::new(state);
        let shutdown = Arc::new(Notify::new());

        let task = {
            let source = source.clone();
            let state = state.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                info!(role = recipient.role().as_str(), ?interval, "unread-count poller started");

                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = shutdown.notified() => break,
                        _ = ticker.tick() => {
                            match poll_once(source.as_ref(), recipient, &state).await {
                                Ok(count) => debug!(count, "unread count polled"),
                                Err(err) => {
                                    // Back to Idle only if nothing was ever loaded.
                                    state.send_if_modified(|s| {
                                        if *s == LoadState::Loading {
                                            *s = LoadState::Idle;
                                            true
                                        } else {
                                            false
                                        }
                                    });
                                    warn!(error = %err, "unread-count poll failed; retrying on next tick");
                                }
                            }
                        }
                    }
                }

                info!("unread-count poller stopped");
            })
        };

        Self {
            recipient,
            source,
            state,
            shutdown,
            task: Some(task),
        }
    }

    pub fn recipient(&self) -> Recipient {
        self.recipient
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Poll immediately, outside the schedule. A failure is returned and
    /// recorded as [`LoadState::Error`].
    pub async fn refresh_now(&self) -> Result<usize, MailboxError> {
        let result = poll_once(self.source.as_ref(), self.recipient, &self.state).await;
        if let Err(err) = &result {
            self.state.send_replace(LoadState::Error(err.to_string()));
        }
        result
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn cancel(&mut self) {
        self.shutdown.notify_one();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for UnreadCountPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn poll_once(
    source: &dyn UnreadCountSource,
    recipient: Recipient,
    state: &watch::Sender<LoadState>,
) -> Result<usize, MailboxError> {
    state.send_if_modified(|s| {
        if *s == LoadState::Idle {
            *s = LoadState::Loading;
            true
        } else {
            false
        }
    });
    let count = source.fetch_unread_count(recipient).await?;
    state.send_replace(LoadState::Loaded(count));
    Ok(count)
}
