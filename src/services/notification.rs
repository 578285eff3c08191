//! Notification service
//!
//! Delivery is just a stored record; reading them is up to the caller.

use tracing::debug;

use crate::error::SplitResult;
use crate::models::{Notification, NotificationKind, ParticipantKey};
use crate::storage::{Ledger, LedgerStore};

pub struct NotificationService<'a, S> {
    ledger: &'a Ledger<S>,
}

impl<'a, S: LedgerStore> NotificationService<'a, S> {
    pub fn new(ledger: &'a Ledger<S>) -> Self {
        Self { ledger }
    }

    pub async fn notify(
        &self,
        recipient: &ParticipantKey,
        kind: NotificationKind,
        message: impl Into<String>,
    ) -> SplitResult<Notification> {
        let notification = Notification::new(recipient.clone(), kind, message);
        self.ledger.store().create(notification.clone()).await?;
        debug!(recipient = %recipient, kind = %kind, "notification stored");
        Ok(notification)
    }

    /// Notify every recipient except `actor`
    pub async fn notify_all<'k>(
        &self,
        recipients: impl IntoIterator<Item = &'k ParticipantKey>,
        actor: &ParticipantKey,
        kind: NotificationKind,
        message: &str,
    ) -> SplitResult<usize> {
        let mut sent = 0;
        for recipient in recipients.into_iter().filter(|r| *r != actor) {
            self.notify(recipient, kind, message).await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// A participant's notifications, newest first
    pub async fn for_recipient(
        &self,
        recipient: &ParticipantKey,
        unread_only: bool,
    ) -> SplitResult<Vec<Notification>> {
        let mut all: Vec<Notification> = self.ledger.store().list().await?;
        all.retain(|n| &n.recipient == recipient && !(unread_only && n.read));
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    /// Mark everything addressed to `recipient` as read
    pub async fn mark_all_read(&self, recipient: &ParticipantKey) -> SplitResult<usize> {
        let unread = self.for_recipient(recipient, true).await?;
        for mut notification in unread.iter().cloned() {
            notification.read = true;
            self.ledger
                .store()
                .update(&notification.id.key(), notification)
                .await?;
        }
        Ok(unread.len())
    }
}
