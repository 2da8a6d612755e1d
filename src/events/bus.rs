//! # Event bus.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: the factory, its workers and the
//! subscriber set publish onto it, and a single listener inside the factory
//! forwards every event to the worker tracker and the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Factory ──┐
//! Worker 0 ─┼──► Bus ──► listener ──► WorkerTracker
//! Worker N ─┘                    └──► SubscriberSet ──► subscribers
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - The ring buffer is shared; a lagging receiver gets `RecvError::Lagged(n)`
//!   and skips the `n` oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for diagnostic events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver observing events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
