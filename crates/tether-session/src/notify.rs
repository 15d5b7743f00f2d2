//! The notification channel between the session layer and whoever
//! presents it (UI, logs, tests).
//!
//! Each subscriber gets its own unbounded `mpsc` queue, so notifications
//! reach every subscriber in the order they were raised and a slow reader
//! never blocks the session layer. Dropping a [`Subscription`]
//! unsubscribes it.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tether_protocol::{DisplayName, EntityId, PlayerId, SessionInfo};
use tokio::sync::mpsc;

/// Something the session layer wants its presenters to know.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A fresh list of joinable rooms arrived.
    RoomsUpdated { rooms: Vec<SessionInfo> },
    /// A user-facing problem: connection failure, start failure, abnormal
    /// shutdown, unusable display name.
    Warning { message: String },
    JoinedRoom { name: String },
    LeftRoom,
    ParticipantJoined { player: PlayerId },
    ParticipantLeft { player: PlayerId },
    DisplayNameSynced { player: PlayerId, name: DisplayName },
    EntitySpawned { entity: EntityId, owner: PlayerId },
    EntityDespawned { entity: EntityId },
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning {
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    senders: Vec<(u64, mpsc::UnboundedSender<Notification>)>,
}

type Shared = Arc<Mutex<Subscribers>>;

fn lock(shared: &Mutex<Subscribers>) -> MutexGuard<'_, Subscribers> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fans notifications out to every live [`Subscription`].
///
/// Cheap to clone; clones share the subscriber list.
#[derive(Clone, Default)]
pub struct Notifier {
    shared: Shared,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. It only sees notifications raised after
    /// this call.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subs = lock(&self.shared);
        subs.next_id += 1;
        let id = subs.next_id;
        subs.senders.push((id, tx));
        Subscription {
            id,
            rx,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Delivers `notification` to every subscriber.
    pub fn notify(&self, notification: Notification) {
        let mut subs = lock(&self.shared);
        subs.senders
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared).senders.len()
    }
}

/// One subscriber's queue. Unsubscribes on drop.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<Notification>,
    shared: Weak<Mutex<Subscribers>>,
}

impl Subscription {
    /// Waits for the next notification. `None` once every [`Notifier`]
    /// clone is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// The next queued notification, if any.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Everything queued right now, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared).senders.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_reaches_all_subscribers_in_order() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        notifier.notify(Notification::LeftRoom);
        notifier.notify(Notification::warning("first"));

        for sub in [&mut a, &mut b] {
            assert_eq!(
                sub.drain(),
                vec![Notification::LeftRoom, Notification::warning("first")]
            );
        }
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let notifier = Notifier::new();
        let sub = notifier.subscribe();
        let _keep = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 2);

        drop(sub);
        assert_eq!(notifier.subscriber_count(), 1);
        notifier.notify(Notification::LeftRoom);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_notifications() {
        let notifier = Notifier::new();
        notifier.notify(Notification::LeftRoom);
        let mut sub = notifier.subscribe();
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_ends_when_notifier_dropped() {
        let notifier = Notifier::new();
        let mut sub = notifier.subscribe();
        notifier.notify(Notification::LeftRoom);
        drop(notifier);

        assert_eq!(sub.recv().await, Some(Notification::LeftRoom));
        assert_eq!(sub.recv().await, None);
    }
}
