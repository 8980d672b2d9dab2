use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::state::score::ScoreState;

/// Fan-out hub multiplexing one match's committed snapshots to N viewers.
///
/// Each subscription owns a dedicated broadcast channel, keyed by handle, so
/// releasing the handle severs delivery at the source: snapshots published
/// after [`unsubscribe`](Self::unsubscribe) returns never reach the
/// receiver. A subscriber that falls behind loses the oldest entries instead
/// of back-pressuring the writer, and because every payload is a full
/// snapshot, a lagging viewer self-heals on its next delivery.
#[derive(Debug)]
pub struct ScoreFeed {
    capacity: usize,
    subscribers: DashMap<Uuid, broadcast::Sender<ScoreState>>,
}

/// Live subscription handed to a viewer: the snapshot taken at subscribe
/// time plus the receiver for everything committed afterwards.
#[derive(Debug)]
pub struct ScoreSubscription {
    /// Handle used to release the subscription.
    pub id: Uuid,
    /// State at the instant of subscription; late joiners render this
    /// immediately instead of waiting for the next commit.
    pub snapshot: ScoreState,
    /// Stream of snapshots committed after `snapshot`, in commit order.
    pub receiver: broadcast::Receiver<ScoreState>,
}

impl ScoreFeed {
    /// Construct a hub whose per-subscriber ring buffers hold `capacity`
    /// snapshots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            subscribers: DashMap::new(),
        }
    }

    /// Register a viewer. The caller supplies the snapshot it observed while
    /// holding the engine's state lock, so there is no window between the
    /// snapshot and the first delivery.
    pub fn subscribe(&self, snapshot: ScoreState) -> ScoreSubscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = broadcast::channel(self.capacity);
        self.subscribers.insert(id, sender);
        ScoreSubscription {
            id,
            snapshot,
            receiver,
        }
    }

    /// Release a subscription. Dropping the stored sender closes the
    /// viewer's channel, so nothing published afterwards is delivered.
    /// Unknown or already-released handles return `false`; callers treat
    /// that as a safe no-op.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    /// Deliver a committed snapshot to all current subscribers. Entries
    /// whose receiver was dropped without an unsubscribe are pruned here.
    pub fn publish(&self, state: &ScoreState) {
        self.subscribers
            .retain(|_, sender| sender.send(state.clone()).is_ok());
    }

    /// Number of registered subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::score::MatchStatus;

    fn state_with_revision(revision: u64) -> ScoreState {
        let mut state = ScoreState::new(Uuid::new_v4(), SystemTime::UNIX_EPOCH);
        state.revision = revision;
        state
    }

    #[tokio::test]
    async fn subscriber_receives_snapshot_then_updates_in_order() {
        let feed = ScoreFeed::new(16);
        let current = state_with_revision(5);

        let mut subscription = feed.subscribe(current.clone());
        assert_eq!(subscription.snapshot, current);

        feed.publish(&state_with_revision(6));
        feed.publish(&state_with_revision(7));

        assert_eq!(subscription.receiver.recv().await.unwrap().revision, 6);
        assert_eq!(subscription.receiver.recv().await.unwrap().revision, 7);
    }

    #[tokio::test]
    async fn unsubscribe_severs_delivery() {
        let feed = ScoreFeed::new(16);
        let mut subscription = feed.subscribe(state_with_revision(0));

        feed.publish(&state_with_revision(1));
        assert_eq!(subscription.receiver.recv().await.unwrap().revision, 1);

        assert!(feed.unsubscribe(subscription.id));

        // Published after release: must never reach the receiver.
        feed.publish(&state_with_revision(2));
        assert!(subscription.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_is_a_safe_no_op_for_unknown_handles() {
        let feed = ScoreFeed::new(16);
        let subscription = feed.subscribe(state_with_revision(0));

        assert!(feed.unsubscribe(subscription.id));
        // Second release of the same handle and a made-up handle both no-op.
        assert!(!feed.unsubscribe(subscription.id));
        assert!(!feed.unsubscribe(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn dropped_subscription_is_pruned_on_the_next_publish() {
        let feed = ScoreFeed::new(16);
        let subscription = feed.subscribe(state_with_revision(0));
        assert_eq!(feed.subscriber_count(), 1);

        drop(subscription);
        feed.publish(&state_with_revision(1));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_fail() {
        let feed = ScoreFeed::new(4);
        feed.publish(&state_with_revision(1));
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagged_subscriber_drops_oldest_but_keeps_receiving() {
        let feed = ScoreFeed::new(2);
        let mut subscription = feed.subscribe(state_with_revision(0));

        for revision in 1..=5 {
            feed.publish(&state_with_revision(revision));
        }

        // Oldest entries were evicted; the stream reports the lag once and
        // then resumes with the most recent snapshots.
        let lagged = subscription.receiver.recv().await;
        assert!(matches!(
            lagged,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        let next = subscription.receiver.recv().await.unwrap();
        assert_eq!(next.revision, 4);
        assert_eq!(next.status, MatchStatus::NotStarted);
    }
}
