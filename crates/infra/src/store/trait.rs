use std::sync::Arc;

use thiserror::Error;

use courierflow_core::{CourierId, OrderId};
use courierflow_orders::{Courier, Order, Transition};

/// Order store operation error.
///
/// Infrastructure failures plus the outcomes of the compare-and-set performed
/// at commit time; domain validation happens before a commit is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The stored order moved on since the decision was taken, or the courier
    /// was bound by someone else in the meantime.
    #[error("concurrent modification: {0}")]
    Concurrency(String),

    /// The courier was deactivated between the caller's read and the commit.
    #[error("courier inactive: {0}")]
    CourierInactive(String),

    /// The commit does not extend the stored state correctly (history not
    /// appended by exactly one entry, version not bumped by one).
    #[error("invalid commit: {0}")]
    InvalidCommit(String),

    #[error("duplicate id: {0}")]
    Duplicate(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Backend unavailable (lock poisoned, connection lost).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Canonical record of orders and couriers.
///
/// ## Commit semantics
///
/// `commit()` applies a [`Transition`] atomically:
/// - the stored order must still be at `transition.previous_version`
/// - the new history must be the stored history plus exactly one entry
/// - a `Bind` effect requires the stored order to have no bound courier and
///   the courier to be active and available, and flips it to unavailable
/// - a `Release` effect flips the courier back to available
///
/// Either the order, its audit entry and the courier flag are all written, or
/// nothing is.
pub trait OrderStore: Send + Sync {
    fn insert_order(&self, order: Order) -> Result<(), StoreError>;

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// All orders; the query layer filters, scopes and paginates.
    fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    fn commit(&self, transition: &Transition) -> Result<(), StoreError>;

    fn insert_courier(&self, courier: Courier) -> Result<(), StoreError>;

    fn get_courier(&self, id: CourierId) -> Result<Option<Courier>, StoreError>;

    fn list_couriers(&self) -> Result<Vec<Courier>, StoreError>;

    /// Administrative enable/disable; returns the updated courier.
    fn set_courier_active(&self, id: CourierId, active: bool) -> Result<Courier, StoreError>;
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn insert_order(&self, order: Order) -> Result<(), StoreError> {
        (**self).insert_order(order)
    }

    fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get_order(id)
    }

    fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_orders()
    }

    fn commit(&self, transition: &Transition) -> Result<(), StoreError> {
        (**self).commit(transition)
    }

    fn insert_courier(&self, courier: Courier) -> Result<(), StoreError> {
        (**self).insert_courier(courier)
    }

    fn get_courier(&self, id: CourierId) -> Result<Option<Courier>, StoreError> {
        (**self).get_courier(id)
    }

    fn list_couriers(&self) -> Result<Vec<Courier>, StoreError> {
        (**self).list_couriers()
    }

    fn set_courier_active(&self, id: CourierId, active: bool) -> Result<Courier, StoreError> {
        (**self).set_courier_active(id, active)
    }
}
