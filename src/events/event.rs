//! # Diagnostic events emitted by the factory and its workers.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Factory lifecycle**: started, shutdown/terminate requested, drain completed
//! - **Task flow**: scheduled, rejected, accepted by a worker, completed, failed
//! - **Worker lifecycle**: started, idle, terminated, dead
//! - **Subscriber health**: overflow, panic
//!
//! The [`Event`] struct carries metadata such as timestamp, task id and label,
//! worker index, queue length and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskfactory::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task_id(7)
//!     .with_worker(2)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task_id, Some(7));
//! assert_eq!(ev.worker, Some(2));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of diagnostic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Factory lifecycle ===
    /// Queue created and workers spawned.
    ///
    /// Sets:
    /// - `reason`: `size=N capacity=M`
    FactoryStarted,

    /// Graceful shutdown requested; the queue is about to close.
    ShutdownRequested,

    /// Every accepted task has been marked done.
    DrainCompleted,

    /// Immediate stop requested; workers are being cancelled.
    TerminateRequested,

    /// All workers exited within the grace period.
    AllWorkersStopped,

    /// Some workers did not exit in time and were aborted.
    ///
    /// Sets:
    /// - `reason`: the stuck workers
    GraceExceeded,

    // === Task flow ===
    /// Task id allocated, about to be enqueued.
    ///
    /// Sets:
    /// - `task_id`, `task`
    TaskScheduled,

    /// Enqueue failed because the queue was closed.
    ///
    /// Sets:
    /// - `task_id`, `task`, `reason`
    TaskRejected,

    /// A worker dequeued the task and is about to run it.
    ///
    /// Sets:
    /// - `task_id`, `task`, `worker`
    /// - `queued`: items still waiting after this one was taken
    TaskAccepted,

    /// The job returned `Ok`.
    ///
    /// Sets:
    /// - `task_id`, `task`, `worker`
    TaskCompleted,

    /// The job returned an error or panicked.
    ///
    /// Sets:
    /// - `task_id`, `task`, `worker`
    /// - `reason`: error message
    TaskFailed,

    // === Worker lifecycle ===
    /// Worker entered its main loop.
    ///
    /// Sets:
    /// - `worker`
    WorkerStarted,

    /// Worker found the queue empty and is waiting.
    ///
    /// Sets:
    /// - `worker`
    WorkerIdle,

    /// Worker observed termination and exited.
    ///
    /// Sets:
    /// - `worker`
    /// - `task_id`, `task`: the task abandoned mid-run, if any
    WorkerTerminated,

    /// Worker hit a queue protocol error and exited its loop.
    ///
    /// Sets:
    /// - `worker`, `reason`
    WorkerDead,

    // === Subscriber health ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Diagnostic event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Id of the task concerned.
    pub task_id: Option<TaskId>,
    /// Task label (`<Task #id: name(args)>`) or subscriber name.
    pub task: Option<Arc<str>>,
    /// Index of the worker concerned.
    pub worker: Option<usize>,
    /// Queue length observed when the event was produced.
    pub queued: Option<usize>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task_id: None,
            task: None,
            worker: None,
            queued: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task_id(mut self, id: TaskId) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches the observed queue length.
    #[inline]
    pub fn with_queued(mut self, n: usize) -> Self {
        self.queued = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for the terminal outcome of a task run (`TaskCompleted` / `TaskFailed`).
    #[inline]
    pub fn is_task_outcome(&self) -> bool {
        matches!(self.kind, EventKind::TaskCompleted | EventKind::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerIdle);
        let b = Event::new(EventKind::WorkerIdle);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn overflow_carries_subscriber_name() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.task.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
        assert!(!ev.is_task_outcome());
    }

    #[test]
    fn only_completed_and_failed_are_outcomes() {
        assert!(Event::new(EventKind::TaskCompleted).is_task_outcome());
        assert!(Event::new(EventKind::TaskFailed).is_task_outcome());
        assert!(!Event::new(EventKind::TaskAccepted).is_task_outcome());
        assert!(!Event::new(EventKind::TaskRejected).is_task_outcome());
    }
}
