//! Courier statistics projection.
//!
//! Per-courier counters folded from committed order events: how many jobs a
//! courier was given, accepted, declined and completed, and what they earned
//! at a flat fee per completed delivery.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use courierflow_core::{CourierId, OrderId};
use courierflow_events::{EventEnvelope, Projection};
use courierflow_orders::{OrderEvent, OrderEventKind};

/// Read model: one courier's track record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourierStats {
    pub courier_id: CourierId,
    pub assigned: u64,
    pub accepted: u64,
    pub declined: u64,
    pub completed: u64,
    /// Minor currency units.
    pub earnings: u64,
}

impl CourierStats {
    pub fn new(courier_id: CourierId) -> Self {
        Self {
            courier_id,
            assigned: 0,
            accepted: 0,
            declined: 0,
            completed: 0,
            earnings: 0,
        }
    }
}

/// Sequence numbers already folded for one order.
///
/// Everything up to `through` has been seen; `ahead` holds numbers that
/// arrived before the gap below them closed.
#[derive(Debug, Default)]
struct Applied {
    through: u64,
    ahead: BTreeSet<u64>,
}

impl Applied {
    /// Records `seq`, returning false when it was already folded.
    fn record(&mut self, seq: u64) -> bool {
        if seq <= self.through || !self.ahead.insert(seq) {
            return false;
        }
        while self.ahead.remove(&(self.through + 1)) {
            self.through += 1;
        }
        true
    }
}

#[derive(Debug, Default)]
struct State {
    applied: HashMap<OrderId, Applied>,
    stats: HashMap<CourierId, CourierStats>,
}

/// Courier statistics, rebuildable from the event stream.
///
/// Cloning yields another handle on the same read model, so the worker that
/// folds events and the readers that serve them share state.
#[derive(Debug, Clone)]
pub struct CourierStatsProjection {
    fee_per_delivery: u64,
    state: Arc<RwLock<State>>,
}

impl CourierStatsProjection {
    pub fn new(fee_per_delivery: u64) -> Self {
        Self {
            fee_per_delivery,
            state: Arc::new(RwLock::new(State::default())),
        }
    }

    pub fn get(&self, courier_id: CourierId) -> Option<CourierStats> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .get(&courier_id)
            .copied()
    }

    /// Most completed deliveries first.
    pub fn all(&self) -> Vec<CourierStats> {
        let mut all: Vec<CourierStats> = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
            .values()
            .copied()
            .collect();
        all.sort_by(|a, b| {
            b.completed
                .cmp(&a.completed)
                .then_with(|| a.courier_id.cmp(&b.courier_id))
        });
        all
    }
}

impl Projection for CourierStatsProjection {
    type Ev = OrderEvent;

    fn apply(&mut self, envelope: &EventEnvelope<OrderEvent>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let fresh = state
            .applied
            .entry(envelope.order_id())
            .or_default()
            .record(envelope.sequence_number());
        if !fresh {
            return;
        }

        let event = envelope.payload();
        let Some(courier_id) = event.courier_id else {
            return;
        };

        let fee = self.fee_per_delivery;
        let stats = state
            .stats
            .entry(courier_id)
            .or_insert_with(|| CourierStats::new(courier_id));
        match event.kind {
            OrderEventKind::Assigned => stats.assigned += 1,
            OrderEventKind::Accepted => stats.accepted += 1,
            OrderEventKind::Declined => stats.declined += 1,
            OrderEventKind::Delivered => {
                stats.completed += 1;
                stats.earnings = stats.completed.saturating_mul(fee);
            }
            _ => {}
        }
    }
}
