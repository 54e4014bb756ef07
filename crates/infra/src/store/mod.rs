//! Order store boundary.
//!
//! Orders and couriers live behind one store so that an order change and the
//! courier availability flip it implies commit together or not at all.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryOrderStore;
pub use r#trait::{OrderStore, StoreError};
