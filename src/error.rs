//! Error types used by the factory runtime, its queue, and submitted jobs.
//!
//! This module defines three error enums:
//!
//! - [`RuntimeError`] - errors returned to the caller by [`Factory`](crate::Factory) operations.
//! - [`TaskError`] - failures raised by individual job executions (isolated inside workers).
//! - [`QueueError`] - misuse of the [`BoundedQueue`](crate::BoundedQueue) protocol.
//!
//! All of them provide `as_label` for logs/metrics.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::tasks::TaskId;

/// # Errors produced by the factory runtime.
///
/// These are pool-level failures: API misuse and shutdown problems.
/// They are returned synchronously to the caller and never swallowed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The factory has not been started yet.
    #[error("factory is not started")]
    NotStarted,

    /// The factory was shut down or terminated; it cannot be started or used again.
    #[error("factory is stopped")]
    AlreadyStopped,

    /// A task was submitted after the queue had been closed for input.
    #[error("task #{task_id} rejected: queue is closed")]
    SubmissionClosed {
        /// Id that was allocated for the rejected task.
        task_id: TaskId,
    },

    /// The pool was terminated while a graceful drain was still waiting.
    #[error("drain interrupted by termination")]
    DrainInterrupted,

    /// OS signal listeners could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),

    /// Workers did not exit within the grace period and were aborted.
    #[error("termination timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// What each stuck worker was doing.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskfactory::RuntimeError;
    ///
    /// let err = RuntimeError::SubmissionClosed { task_id: 7 };
    /// assert_eq!(err.as_label(), "runtime_submission_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotStarted => "runtime_not_started",
            RuntimeError::AlreadyStopped => "runtime_already_stopped",
            RuntimeError::SubmissionClosed { .. } => "runtime_submission_closed",
            RuntimeError::DrainInterrupted => "runtime_drain_interrupted",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by job execution.
///
/// A worker catches these (and panics, reported as [`TaskError::Panicked`]),
/// publishes them as `TaskFailed`, and keeps going.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Job returned an error.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Job panicked while running.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Wraps any displayable error as [`TaskError::Fail`].
    ///
    /// ```
    /// use taskfactory::TaskError;
    ///
    /// let err = TaskError::fail("disk full");
    /// assert_eq!(err.to_string(), "execution failed: disk full");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Builds [`TaskError::Panicked`] from a payload returned by `catch_unwind`.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        TaskError::Panicked {
            info: panic_message(payload),
        }
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Queue protocol errors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// `put` was called on (or was waiting on) a closed queue.
    #[error("queue is closed")]
    Closed,

    /// `mark_done` was called more times than items were retrieved.
    #[error("mark_done called without a matching get")]
    NotClaimed,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Closed => "queue_closed",
            QueueError::NotClaimed => "queue_not_claimed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(
            TaskError::from_panic(s.as_ref()),
            TaskError::Panicked { info: "boom".into() }
        );

        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        assert_eq!(
            TaskError::from_panic(owned.as_ref()),
            TaskError::Panicked {
                info: "owned boom".into()
            }
        );

        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(
            TaskError::from_panic(other.as_ref()),
            TaskError::Panicked {
                info: "unknown panic".into()
            }
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(QueueError::NotClaimed.as_label(), "queue_not_claimed");
        let grace = RuntimeError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec!["worker-0".into()],
        };
        assert_eq!(grace.as_label(), "runtime_grace_exceeded");
        assert!(grace.to_string().contains("worker-0"));
    }
}
