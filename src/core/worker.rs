//! # Worker: one consumer of the factory queue.
//!
//! Repeatedly pulls a [`Task`] from the shared [`BoundedQueue`], runs it via
//! [`run_task`], and marks the queue slot done, until the factory cancels it.
//!
//! ## Event flow
//! ```text
//! WorkerStarted
//! loop {
//!   [queue empty?] → WorkerIdle
//!   get() ─► TaskAccepted ─► run_task() ─► TaskCompleted | TaskFailed
//!   mark_done()
//! }
//! WorkerTerminated (cancelled) | WorkerDead (queue protocol error)
//! ```
//!
//! ## Architecture
//! ```text
//! Factory::start() ──► Worker::new(idx, queue, bus) ──► JoinSet::spawn(worker.run(token))
//!
//! loop {
//!   ├─► select { token.cancelled() → exit, queue.get() → task }
//!   ├─► select { token.cancelled() → abandon task, exit
//!   │            run_task(task)    → Ok / Err (reported, never propagated) }
//!   └─► queue.mark_done()          (exactly once per task, success or failure)
//! }
//! ```
//!
//! ## Rules
//! - A failing or panicking job never ends the loop and never skips `mark_done`.
//! - Workers ignore OS signals; only the factory's token stops them.
//! - On cancellation mid-task the job's future is dropped; its remaining side
//!   effects are abandoned and the slot is not marked done.

use std::sync::Arc;

use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_task,
    events::{Bus, Event, EventKind},
    queue::BoundedQueue,
    tasks::Task,
};

/// Why a worker left its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Cancelled by the factory.
    Terminated,
    /// Queue protocol violation; details in the `WorkerDead` event.
    Dead,
}

/// A single queue consumer.
pub struct Worker {
    /// Index in `0..size`.
    pub idx: usize,
    /// Queue shared with the factory and the other workers.
    pub queue: Arc<BoundedQueue<Task>>,
    /// Internal event bus.
    pub bus: Bus,
}

impl Worker {
    pub fn new(idx: usize, queue: Arc<BoundedQueue<Task>>, bus: Bus) -> Self {
        Self { idx, queue, bus }
    }

    /// Runs the worker loop until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) -> WorkerExit {
        self.publish(Event::new(EventKind::WorkerStarted));

        loop {
            // Racy by nature; only drives the idle diagnostic.
            if self.queue.is_empty() {
                self.publish(Event::new(EventKind::WorkerIdle));
            }

            let task = select! {
                biased;
                _ = token.cancelled() => break,
                task = self.queue.get() => task,
            };

            let label: Arc<str> = Arc::from(task.to_string());
            let id = task.id();
            self.publish(
                Event::new(EventKind::TaskAccepted)
                    .with_task_id(id)
                    .with_task(Arc::clone(&label))
                    .with_queued(self.queue.len()),
            );

            select! {
                biased;
                _ = token.cancelled() => {
                    self.publish(
                        Event::new(EventKind::WorkerTerminated)
                            .with_task_id(id)
                            .with_task(label),
                    );
                    return WorkerExit::Terminated;
                }
                // Outcome already published by `run_task`.
                _ = run_task(task, Arc::clone(&label), self.idx, &token, &self.bus) => {}
            }

            if let Err(e) = self.queue.mark_done() {
                self.publish(Event::new(EventKind::WorkerDead).with_reason(e.to_string()));
                return WorkerExit::Dead;
            }
        }

        self.publish(Event::new(EventKind::WorkerTerminated));
        WorkerExit::Terminated
    }

    fn publish(&self, ev: Event) {
        self.bus.publish(ev.with_worker(self.idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Args, JobFn, JobRef, TaskError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(2);

    fn counting_job(hits: Arc<AtomicUsize>) -> JobRef {
        JobFn::arc("count", move |args: Args, _c: CancellationToken| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if args.kw("fail").is_some() {
                    return Err(TaskError::fail("asked to fail"));
                }
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn keeps_going_after_failures() {
        let queue = Arc::new(BoundedQueue::new(8));
        let bus = Bus::new(64);
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let job = counting_job(Arc::clone(&hits));

        let handle = tokio::spawn(Worker::new(0, Arc::clone(&queue), bus).run(token.clone()));

        for id in 1..=5 {
            let args = if id == 3 {
                Args::new().kwarg("fail", true)
            } else {
                Args::new()
            };
            queue
                .put(Task::new(id, Arc::clone(&job), args))
                .await
                .expect("queue closed");
        }
        queue.close();
        timeout(WAIT, queue.join()).await.expect("queue never drained");
        assert_eq!(hits.load(Ordering::SeqCst), 5);

        token.cancel();
        let exit = timeout(WAIT, handle)
            .await
            .expect("worker did not stop")
            .expect("worker panicked");
        assert_eq!(exit, WorkerExit::Terminated);
    }

    #[tokio::test]
    async fn cancellation_abandons_running_task() {
        let queue = Arc::new(BoundedQueue::new(2));
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let slow: JobRef = {
            let finished = Arc::clone(&finished);
            JobFn::arc("slow", move |_a: Args, _c: CancellationToken| {
                let finished = Arc::clone(&finished);
                async move {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TaskError>(())
                }
            })
        };
        queue
            .put(Task::new(1, slow, Args::new()))
            .await
            .expect("queue closed");

        let handle = tokio::spawn(Worker::new(7, Arc::clone(&queue), bus).run(token.clone()));
        loop {
            let ev = rx.recv().await.expect("bus closed");
            if ev.kind == EventKind::TaskAccepted {
                assert_eq!(ev.worker, Some(7));
                break;
            }
        }

        token.cancel();
        let exit = timeout(WAIT, handle)
            .await
            .expect("worker did not stop")
            .expect("worker panicked");
        assert_eq!(exit, WorkerExit::Terminated);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        // Abandoned, never marked done.
        assert_eq!(queue.unfinished(), 1);
    }
}
