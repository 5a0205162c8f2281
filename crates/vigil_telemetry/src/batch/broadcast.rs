//! Snapshot broadcasting.
//!
//! A [`Broadcaster`] is constructed explicitly and passed into each batch
//! that should publish through it; there is no process-wide registry, so
//! test isolation is a matter of constructing a fresh instance. Delivery is
//! publish-only with no queuing: each snapshot is handed to the subscribers
//! present at broadcast time, at most once per fill cycle, and a failing
//! subscriber never prevents delivery to the others.

use super::Snapshot;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

type SubscriberFn<T> = Box<dyn Fn(&Snapshot<T>) + Send + Sync>;

/// Fans batch snapshots out to registered subscribers.
pub struct Broadcaster<T> {
    subscribers: RwLock<Vec<SubscriberFn<T>>>,
}

impl<T> Broadcaster<T> {
    /// Creates a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Registers a subscriber callback.
    ///
    /// Subscribers registered after a broadcast has started are first
    /// served by the next broadcast.
    pub fn subscribe<F>(&self, subscriber: F)
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Box::new(subscriber));
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Delivers a snapshot to every current subscriber, fire-and-continue.
    ///
    /// A panicking subscriber is isolated and logged; the remaining
    /// subscribers still receive the snapshot and the producer observes no
    /// failure.
    pub fn broadcast(&self, snapshot: &Snapshot<T>) {
        let subscribers = self.subscribers.read();
        for (position, subscriber) in subscribers.iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| subscriber(snapshot))).is_err() {
                error!(
                    subscriber = position,
                    owner = %snapshot.owner(),
                    "snapshot subscriber panicked, continuing with remaining subscribers"
                );
            }
        }
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
