//! Progress change notification channels.

use std::collections::HashMap;
use std::sync::Mutex;

use questline_core::{UserId, UserProgress};
use tokio::sync::watch;

/// One watch channel per subscribed user, fed by every progress mutation.
///
/// Channels are created lazily on first subscription or first publish and
/// kept for the lifetime of the backend; the per-venue user population is
/// small enough that senders are never reaped.
#[derive(Default)]
pub(crate) struct ProgressChannels {
    senders: Mutex<HashMap<UserId, watch::Sender<Option<UserProgress>>>>,
}

impl ProgressChannels {
    /// Broadcast the new state of a user's record to any subscribers.
    pub(crate) fn publish(&self, user: &UserId, value: Option<UserProgress>) {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = senders.get(user) {
            // Send only fails when every receiver is gone; the channel stays
            // usable for future subscribers either way.
            let _ = tx.send(value);
        }
    }

    /// Subscribe to a user's record, seeding a fresh channel with `current`.
    pub(crate) fn subscribe(
        &self,
        user: &UserId,
        current: Option<UserProgress>,
    ) -> watch::Receiver<Option<UserProgress>> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .entry(user.clone())
            .or_insert_with(|| watch::channel(current).0)
            .subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let channels = ProgressChannels::default();
        let user = UserId::new("uid-1");

        let mut rx = channels.subscribe(&user, None);
        assert!(rx.borrow().is_none());

        let progress = UserProgress::new(user.clone(), "Explorer Alice");
        channels.publish(&user, Some(progress.clone()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&progress));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let channels = ProgressChannels::default();
        let user = UserId::new("uid-1");
        channels.publish(&user, None);
    }
}
