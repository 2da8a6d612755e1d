//! # Execute a single task.
//!
//! Runs one [`Task`]'s job with its arguments, turns panics into
//! [`TaskError::Panicked`], and publishes exactly one outcome event.
//!
//! ## Event flow
//! ```text
//! Success:  job.call() → Ok(())  → publish TaskCompleted
//! Failure:  job.call() → Err(e)  → publish TaskFailed{reason = e}
//! Panic:    job.call() → panic   → publish TaskFailed{reason = "panicked: ..."}
//! ```
//!
//! ## Rules
//! - Only failures of the job itself are caught; the caller decides what to do
//!   with the returned error (workers report and move on).
//! - The job gets a child token: cancelling it never affects the parent.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::Task,
};

/// Executes `task` on behalf of worker `worker`, publishing its outcome to `bus`.
///
/// `label` is the task's display form, computed once by the caller.
pub async fn run_task(
    task: Task,
    label: Arc<str>,
    worker: usize,
    parent: &CancellationToken,
    bus: &Bus,
) -> Result<(), TaskError> {
    let (id, job, args) = task.into_parts();
    let ctx = parent.child_token();

    // A job may panic while building its future as well as while polling it.
    let res = match panic::catch_unwind(AssertUnwindSafe(|| job.call(args, ctx))) {
        Ok(fut) => match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(res) => res,
            Err(payload) => Err(TaskError::from_panic(payload.as_ref())),
        },
        Err(payload) => Err(TaskError::from_panic(payload.as_ref())),
    };

    let ev = match &res {
        Ok(()) => Event::new(EventKind::TaskCompleted),
        Err(e) => Event::new(EventKind::TaskFailed).with_reason(e.to_string()),
    };
    bus.publish(ev.with_task_id(id).with_task(label).with_worker(worker));
    res
}
