//! Change notifications for problem store observers.
//!
//! # Responsibility
//! - Fan out store mutations to every live subscriber.
//! - Name which source changed so observers reload only that source.
//!
//! # Invariants
//! - Publishing never blocks: subscriber channels are unbounded.
//! - Subscribers whose receiver was dropped are pruned on the next publish.

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;
use std::sync::{Arc, Mutex};

/// Which persisted source changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Rows in the problem table were inserted, updated or deleted.
    ProblemsChanged,
    /// The order index record was rewritten.
    OrderChanged,
}

/// Receiving end of one subscription.
pub type Subscription = Receiver<ChangeEvent>;

/// Cloneable publisher shared by store writers.
#[derive(Debug, Clone, Default)]
pub struct ChangeFeed {
    subscribers: Arc<Mutex<Vec<Sender<ChangeEvent>>>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = unbounded();
        self.lock().push(sender);
        receiver
    }

    /// Sends `events` to every live subscriber, in order.
    pub fn publish(&self, events: &[ChangeEvent]) {
        let mut subscribers = self.lock();
        subscribers.retain(|sender| {
            events
                .iter()
                .all(|event| sender.send(*event).is_ok())
        });
        debug!(
            "event=change_publish module=notify status=ok events={:?} subscribers={}",
            events,
            subscribers.len()
        );
    }

    /// Number of live subscribers as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<ChangeEvent>>> {
        // A poisoned list is still a valid list of senders.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeEvent, ChangeFeed};

    #[test]
    fn every_subscriber_receives_events_in_order() {
        let feed = ChangeFeed::new();
        let first = feed.subscribe();
        let second = feed.subscribe();

        feed.publish(&[ChangeEvent::OrderChanged, ChangeEvent::ProblemsChanged]);

        for subscription in [first, second] {
            let received = subscription.try_iter().collect::<Vec<_>>();
            assert_eq!(
                received,
                vec![ChangeEvent::OrderChanged, ChangeEvent::ProblemsChanged]
            );
        }
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let feed = ChangeFeed::new();
        let kept = feed.subscribe();
        drop(feed.subscribe());
        assert_eq!(feed.subscriber_count(), 2);

        feed.publish(&[ChangeEvent::ProblemsChanged]);
        assert_eq!(feed.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(ChangeEvent::ProblemsChanged));
    }
}
