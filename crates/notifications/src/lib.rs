//! Notification domain module.
//!
//! Pure data: who gets told about which order event, what they read, and where
//! the dashboard should take them. Storage and delivery live in infra.

pub mod navigation;
pub mod notification;
pub mod recipient;
pub mod routing;

pub use navigation::navigation_target;
pub use notification::Notification;
pub use recipient::Recipient;
pub use routing::{recipients_for, roles_for};
