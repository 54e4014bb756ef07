//! Infrastructure layer: stores, engine orchestration, notifications, queries,
//! background workers, configuration and external collaborators.

pub mod config;
pub mod engine;
pub mod external;
pub mod notifications;
pub mod poller;
pub mod projections;
pub mod query;
pub mod store;
pub mod workers;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub(crate) mod test_support;
