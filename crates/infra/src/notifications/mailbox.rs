use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use courierflow_core::NotificationId;
use courierflow_notifications::{Notification, Recipient};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("notification not found")]
    NotFound,
    #[error("mailbox unavailable: {0}")]
    Unavailable(String),
}

/// Per-recipient notification storage.
pub trait Mailbox: Send + Sync {
    fn deposit(&self, notification: Notification) -> Result<(), MailboxError>;

    /// Newest first.
    fn list(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError>;

    /// Unread only, newest first.
    fn list_unread(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError>;

    fn unread_count(&self, recipient: Recipient) -> Result<usize, MailboxError>;

    /// Idempotent. A notification outside `recipient`'s mailbox is `NotFound`.
    fn mark_read(&self, recipient: Recipient, id: NotificationId) -> Result<(), MailboxError>;

    /// Marks what is in the mailbox when the call takes effect; later arrivals
    /// stay unread. Returns how many were flipped.
    fn mark_all_read(&self, recipient: Recipient) -> Result<usize, MailboxError>;
}

impl<M> Mailbox for Arc<M>
where
    M: Mailbox + ?Sized,
{
    fn deposit(&self, notification: Notification) -> Result<(), MailboxError> {
        (**self).deposit(notification)
    }

    fn list(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError> {
        (**self).list(recipient, limit, offset)
    }

    fn list_unread(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError> {
        (**self).list_unread(recipient, limit, offset)
    }

    fn unread_count(&self, recipient: Recipient) -> Result<usize, MailboxError> {
        (**self).unread_count(recipient)
    }

    fn mark_read(&self, recipient: Recipient, id: NotificationId) -> Result<(), MailboxError> {
        (**self).mark_read(recipient, id)
    }

    fn mark_all_read(&self, recipient: Recipient) -> Result<usize, MailboxError> {
        (**self).mark_all_read(recipient)
    }
}

/// In-memory mailboxes for tests/dev.
///
/// One mutex covers every mailbox, so `mark_all_read` sees a consistent cutoff.
#[derive(Debug, Default)]
pub struct InMemoryMailbox {
    boxes: Mutex<HashMap<Recipient, Vec<Notification>>>,
}

impl InMemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Recipient, Vec<Notification>>>, MailboxError> {
        self.boxes
            .lock()
            .map_err(|_| MailboxError::Unavailable("lock poisoned".to_string()))
    }

    fn page(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, MailboxError> {
        let boxes = self.lock()?;
        Ok(boxes
            .get(&recipient)
            .map(|items| {
                items
                    .iter()
                    .rev()
                    .filter(|n| !unread_only || !n.is_read)
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Mailbox for InMemoryMailbox {
    fn deposit(&self, notification: Notification) -> Result<(), MailboxError> {
        let recipient = notification.recipient;
        self.lock()?.entry(recipient).or_default().push(notification);
        Ok(())
    }

    fn list(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError> {
        self.page(recipient, limit, offset, false)
    }

    fn list_unread(
        &self,
        recipient: Recipient,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Notification>, MailboxError> {
        self.page(recipient, limit, offset, true)
    }

    fn unread_count(&self, recipient: Recipient) -> Result<usize, MailboxError> {
        Ok(self
            .lock()?
            .get(&recipient)
            .map(|items| items.iter().filter(|n| !n.is_read).count())
            .unwrap_or(0))
    }

    fn mark_read(&self, recipient: Recipient, id: NotificationId) -> Result<(), MailboxError> {
        let mut boxes = self.lock()?;
        let notification = boxes
            .get_mut(&recipient)
            .and_then(|items| items.iter_mut().find(|n| n.id == id))
            .ok_or(MailboxError::NotFound)?;
        notification.is_read = true;
        Ok(())
    }

    fn mark_all_read(&self, recipient: Recipient) -> Result<usize, MailboxError> {
        let mut boxes = self.lock()?;
        Ok(boxes
            .get_mut(&recipient)
            .map(|items| {
                items
                    .iter_mut()
                    .filter(|n| !n.is_read)
                    .map(|n| n.is_read = true)
                    .count()
            })
            .unwrap_or(0))
    }
}
