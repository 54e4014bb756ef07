//! Append-only status history (the order's audit trail).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courierflow_auth::Principal;

use crate::order::{DeliveryStatus, OrderStatus};

/// A status on either lifecycle track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "track", content = "status", rename_all = "snake_case")]
pub enum TrackedStatus {
    Order(OrderStatus),
    Delivery(DeliveryStatus),
}

impl core::fmt::Display for TrackedStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TrackedStatus::Order(s) => f.write_str(s.as_str()),
            TrackedStatus::Delivery(s) => f.write_str(s.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: TrackedStatus,
    pub actor: Principal,
    pub at: DateTime<Utc>,
}

/// Ordered, append-only list of history entries.
///
/// There is no way to edit or remove an entry once appended. Timestamps are
/// non-decreasing: an append whose clock reads earlier than the last entry is
/// recorded at the last entry's time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusHistory(Vec<HistoryEntry>);

impl StatusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(
        &mut self,
        status: TrackedStatus,
        actor: Principal,
        at: DateTime<Utc>,
    ) -> &HistoryEntry {
        let at = match self.0.last() {
            Some(last) if last.at > at => last.at,
            _ => at,
        };
        self.0.push(HistoryEntry { status, actor, at });
        &self.0[self.0.len() - 1]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// True when `next` is exactly this history plus one appended entry.
    pub fn is_extended_by_one(&self, next: &StatusHistory) -> bool {
        next.0.len() == self.0.len() + 1 && next.0.starts_with(&self.0)
    }
}
