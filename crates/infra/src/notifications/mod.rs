//! Notification fan-out and mailboxes.

pub mod fanout;
pub mod mailbox;

pub use fanout::NotificationFanout;
pub use mailbox::{InMemoryMailbox, Mailbox, MailboxError};
