//! Aggregate root trait.

/// Orders and couriers are mutated only through versioned commits.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of committed changes. Starts at 1 and advances by exactly one
    /// per commit, which is what the store's compare-and-set checks against.
    fn version(&self) -> u64;
}
