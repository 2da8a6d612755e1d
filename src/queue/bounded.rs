//! # Bounded, joinable FIFO queue.
//!
//! [`BoundedQueue`] is the single channel between the factory (producer) and
//! its workers (consumers).
//!
//! ## Architecture
//! ```text
//! put(item) ──► acquire slot permit ──► [VecDeque] ──► notify ──► get() ──► worker
//!                  (waits when full)                                  │
//!                                                                     ▼
//! join() ◄── unfinished == 0 ◄── mark_done() ── release slot permit ◄─┘
//! ```
//!
//! ## Rules
//! - A slot is held from `put` until the matching `mark_done`, so items that
//!   are queued **or** being processed never exceed `capacity`.
//! - `close()` rejects further `put`s (including ones already waiting for a
//!   slot) but keeps queued items available to `get`.
//! - `get()` on an empty queue waits, even after `close()`.
//! - `join()` completes once every item put has been retrieved and marked done.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{Notify, Semaphore, watch};

use crate::error::QueueError;

struct QueueState<T> {
    items: VecDeque<T>,
    /// Items handed out by `get` and not yet marked done.
    claimed: usize,
    closed: bool,
}

/// Fixed-capacity FIFO shared between one producer side and many consumers.
pub struct BoundedQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
    slots: Semaphore,
    available: Notify,
    unfinished: watch::Sender<usize>,
}

impl<T> BoundedQueue<T> {
    /// Creates an empty queue. Capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (unfinished, _) = watch::channel(0);
        Self {
            capacity,
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                claimed: 0,
                closed: false,
            }),
            slots: Semaphore::new(capacity),
            available: Notify::new(),
            unfinished,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        // Critical sections never panic midway, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues `item` at the tail, waiting while the queue is at capacity.
    ///
    /// Returns [`QueueError::Closed`] if the queue is closed before or while waiting.
    pub async fn put(&self, item: T) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }
        let permit = self.slots.acquire().await.map_err(|_| QueueError::Closed)?;
        {
            let mut state = self.lock();
            if state.closed {
                return Err(QueueError::Closed);
            }
            // Returned by `mark_done`.
            permit.forget();
            state.items.push_back(item);
            self.unfinished.send_modify(|n| *n += 1);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Removes and returns the head item, waiting while the queue is empty.
    ///
    /// The caller must call [`mark_done`](Self::mark_done) once it has finished with the item.
    pub async fn get(&self) -> T {
        loop {
            // Created before the check so a concurrent `notify_one` is not lost.
            let notified = self.available.notified();
            {
                let mut state = self.lock();
                if let Some(item) = state.items.pop_front() {
                    state.claimed += 1;
                    if !state.items.is_empty() {
                        self.available.notify_one();
                    }
                    return item;
                }
            }
            notified.await;
        }
    }

    /// Marks one previously retrieved item as processed.
    ///
    /// Frees its capacity slot and wakes `join()` when nothing is left unfinished.
    pub fn mark_done(&self) -> Result<(), QueueError> {
        {
            let mut state = self.lock();
            if state.claimed == 0 {
                return Err(QueueError::NotClaimed);
            }
            state.claimed -= 1;
            self.unfinished.send_modify(|n| *n -= 1);
        }
        self.slots.add_permits(1);
        Ok(())
    }

    /// Rejects any further `put`; queued items stay available to `get`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.slots.close();
    }

    /// Waits until every item put so far has been retrieved and marked done.
    pub async fn join(&self) {
        let mut rx = self.unfinished.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of items waiting to be retrieved.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items put but not yet marked done (queued + in progress).
    pub fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);
    const SHORT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn preserves_fifo_order() {
        let q = BoundedQueue::new(8);
        for i in 0..5 {
            q.put(i).await.expect("queue closed");
        }
        let mut out = Vec::new();
        for _ in 0..5 {
            out.push(q.get().await);
            q.mark_done().expect("claimed");
        }
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert_eq!(q.unfinished(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn items_are_consumed_once() {
        let q = Arc::new(BoundedQueue::new(16));
        let total: u64 = 200;
        let consumers = 4;

        let mut handles = Vec::new();
        for _ in 0..consumers {
            let q = Arc::clone(&q);
            handles.push(tokio::spawn(async move {
                let mut mine = Vec::new();
                loop {
                    let item: u64 = q.get().await;
                    q.mark_done().expect("claimed");
                    if item == u64::MAX {
                        break;
                    }
                    mine.push(item);
                }
                mine
            }));
        }

        for id in 0..total {
            q.put(id).await.expect("queue closed");
        }
        for _ in 0..consumers {
            q.put(u64::MAX).await.expect("queue closed");
        }

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.await.expect("consumer panicked") {
                // Each item should be observed at most once.
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len() as u64, total);
        timeout(WAIT, q.join()).await.expect("join timed out");
    }

    #[tokio::test]
    async fn get_wakes_on_put() {
        let q = Arc::new(BoundedQueue::new(1));
        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.get().await })
        };
        tokio::time::sleep(SHORT).await;
        assert!(!consumer.is_finished());

        q.put(99).await.expect("queue closed");
        let got = timeout(WAIT, consumer)
            .await
            .expect("consumer not woken")
            .expect("consumer panicked");
        assert_eq!(got, 99);
    }

    #[tokio::test]
    async fn put_waits_for_mark_done_when_full() {
        let q = Arc::new(BoundedQueue::new(2));
        q.put(1).await.expect("queue closed");
        q.put(2).await.expect("queue closed");

        // Retrieved but unfinished still occupies a slot.
        assert_eq!(q.get().await, 1);
        assert!(timeout(SHORT, q.put(3)).await.is_err());

        q.mark_done().expect("claimed");
        timeout(WAIT, q.put(3))
            .await
            .expect("slot not released")
            .expect("queue closed");
        assert_eq!(q.unfinished(), 2);
        assert_eq!(q.len(), 2);
    }

    #[tokio::test]
    async fn put_fails_after_close_but_queued_items_drain() {
        let q = BoundedQueue::new(4);
        q.put("a").await.expect("queue closed");
        q.close();

        assert_eq!(q.put("late").await, Err(QueueError::Closed));
        assert!(q.is_closed());
        assert_eq!(q.get().await, "a");
        q.mark_done().expect("claimed");
        timeout(WAIT, q.join()).await.expect("join timed out");
    }

    #[tokio::test]
    async fn close_releases_blocked_producer() {
        let q = Arc::new(BoundedQueue::new(1));
        q.put(1).await.expect("queue closed");

        let producer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.put(2).await })
        };
        tokio::time::sleep(SHORT).await;
        assert!(!producer.is_finished());

        q.close();
        let res = timeout(WAIT, producer)
            .await
            .expect("producer not released")
            .expect("producer panicked");
        assert_eq!(res, Err(QueueError::Closed));
        assert_eq!(q.unfinished(), 1);
    }

    #[tokio::test]
    async fn join_waits_for_mark_done_not_get() {
        let q = Arc::new(BoundedQueue::new(4));
        q.put(()).await.expect("queue closed");
        q.close();
        q.get().await;

        assert!(timeout(SHORT, q.join()).await.is_err());
        q.mark_done().expect("claimed");
        timeout(WAIT, q.join()).await.expect("join timed out");
    }

    #[tokio::test]
    async fn mark_done_without_get_is_rejected() {
        let q = BoundedQueue::new(2);
        assert_eq!(q.mark_done(), Err(QueueError::NotClaimed));

        q.put(1).await.expect("queue closed");
        // Queued but not retrieved: still no claim.
        assert_eq!(q.mark_done(), Err(QueueError::NotClaimed));

        q.get().await;
        assert_eq!(q.mark_done(), Ok(()));
        assert_eq!(q.mark_done(), Err(QueueError::NotClaimed));
    }

    #[test]
    fn capacity_is_clamped() {
        let q: BoundedQueue<()> = BoundedQueue::new(0);
        assert_eq!(q.capacity(), 1);
        assert!(q.is_empty());
    }
}
