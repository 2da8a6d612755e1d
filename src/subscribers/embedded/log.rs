//! # LogWriter: events as `tracing` records
//!
//! Renders every [`Event`] as a structured `tracing` record under the
//! `taskfactory` target. Install any `tracing` subscriber (e.g.
//! `tracing_subscriber::fmt()`) to see them.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO taskfactory: factory started size=4 capacity=12
//! INFO taskfactory: task scheduled task_id=1 task=<Task #1: resize("a.png")>
//! INFO taskfactory: worker accepted task worker=0 task_id=1 queued=0
//! WARN taskfactory: task failed worker=0 task_id=1 reason=execution failed: bad header
//! INFO taskfactory: worker idle worker=0
//! INFO taskfactory: worker terminated worker=0
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "taskfactory";

/// Event writer subscriber.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::FactoryStarted => {
                info!(target: TARGET, "factory started {reason}");
            }
            EventKind::ShutdownRequested => {
                info!(target: TARGET, "shutting down (waiting for tasks to complete)");
            }
            EventKind::DrainCompleted => {
                info!(target: TARGET, "processing complete, shutting down workers");
            }
            EventKind::TerminateRequested => {
                info!(target: TARGET, "terminating workers");
            }
            EventKind::AllWorkersStopped => {
                info!(target: TARGET, "all workers stopped");
            }
            EventKind::GraceExceeded => {
                error!(target: TARGET, stuck = reason, "workers did not stop within grace");
            }
            EventKind::TaskScheduled => {
                info!(target: TARGET, task_id = e.task_id, task, "task scheduled");
            }
            EventKind::TaskRejected => {
                warn!(target: TARGET, task_id = e.task_id, task, reason, "task rejected");
            }
            EventKind::TaskAccepted => {
                info!(target: TARGET, worker = e.worker, task_id = e.task_id, task, "worker accepted task");
                debug!(target: TARGET, queued = e.queued, "queue size is now");
            }
            EventKind::TaskCompleted => {
                info!(target: TARGET, worker = e.worker, task_id = e.task_id, task, "task complete");
            }
            EventKind::TaskFailed => {
                warn!(target: TARGET, worker = e.worker, task_id = e.task_id, task, reason, "task failed");
            }
            EventKind::WorkerStarted => {
                info!(target: TARGET, worker = e.worker, "worker entering main loop");
            }
            EventKind::WorkerIdle => {
                info!(target: TARGET, worker = e.worker, "worker idling");
            }
            EventKind::WorkerTerminated => {
                info!(target: TARGET, worker = e.worker, abandoned = e.task.as_deref(), "worker terminated");
            }
            EventKind::WorkerDead => {
                error!(target: TARGET, worker = e.worker, reason, "worker died");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: TARGET, subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
