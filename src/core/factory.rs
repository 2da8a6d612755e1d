//! # Factory: a fixed pool of workers fed by one bounded queue.
//!
//! The [`Factory`] owns the event bus, the [`SubscriberSet`], and the lifecycle
//! of its worker pool. Callers submit work with [`Factory::run`]; workers pull
//! tasks in FIFO order and run them concurrently, up to `size` at once.
//!
//! ## Key responsibilities
//! - allocate task ids and enqueue tasks (with backpressure once the queue is full)
//! - spawn `size` workers on [`start`](Factory::start)
//! - subscribe to the [`Bus`] and **fan-out** events via [`SubscriberSet`]
//! - graceful drain ([`shutdown`](Factory::shutdown)) and abrupt stop
//!   ([`terminate`](Factory::terminate)) bounded by [`FactoryConfig::grace`]
//!
//! ## High-level architecture
//! ```text
//! Producers:
//!   run(job, args) ──► TaskIdGenerator::next() ──► BoundedQueue::put(Task)   (waits while full)
//!
//! Pool (spawned by start()):
//!   pool token ──► child_token() ──► Worker[0] ... Worker[size-1]   (JoinSet)
//!                                        │
//!                                        └─► get() → run_task() → mark_done()
//!
//! Event flow:
//!   Factory / Worker ── publish(Event) ──► Bus ──► listener ──► WorkerTracker::update()
//!                                                          └──► SubscriberSet::emit()
//!   listener lagging behind the bus ──► SubscriberOverflow{task = "factory-listener"}
//!
//! Shutdown path:
//!   shutdown():  close queue ─► join() (all accepted tasks done) ─► terminate()
//!   terminate(): close queue ─► pool token.cancel() ─► wait workers within grace:
//!                   ├─ Ok (all joined)  → AllWorkersStopped
//!                   └─ Timeout exceeded → abort, GraceExceeded (WorkerTracker snapshot)
//!                ─► listener drains the bus ─► SubscriberSet::shutdown() (queued events delivered)
//! ```
//!
//! When `terminate()` returns, subscribers have processed every event up to
//! `AllWorkersStopped` / `GraceExceeded`. Later events (e.g. a rejected
//! submission) reach only direct [`events`](Factory::events) receivers.
//!
//! ## Lifecycle
//! ```text
//! NotStarted ──start()──► Running ──shutdown() / terminate()──► Stopped
//! ```
//! `Stopped` is final: a factory is never restarted.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskfactory::{Args, Factory, FactoryConfig, JobFn, JobRef, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = Factory::new(FactoryConfig::with_size(2));
//!     let total = Arc::new(AtomicUsize::new(0));
//!
//!     let add: JobRef = {
//!         let total = Arc::clone(&total);
//!         JobFn::arc("add", move |args: Args, _ctx: CancellationToken| {
//!             let total = Arc::clone(&total);
//!             async move {
//!                 let n = args.get(0).and_then(|v| v.as_u64()).unwrap_or(0);
//!                 total.fetch_add(n as usize, Ordering::SeqCst);
//!                 Ok::<_, TaskError>(())
//!             }
//!         })
//!     };
//!
//!     for n in 1..=4 {
//!         factory.run(&add, Args::new().arg(n)).await?;
//!     }
//!     factory.shutdown().await?;
//!     assert_eq!(total.load(Ordering::SeqCst), 10);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{
    select,
    sync::broadcast::{
        self,
        error::{RecvError, TryRecvError},
    },
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::FactoryBuilder,
        config::FactoryConfig,
        shutdown,
        tracker::WorkerTracker,
        worker::{Worker, WorkerExit},
    },
    error::{QueueError, RuntimeError},
    events::{Bus, Event, EventKind},
    queue::BoundedQueue,
    subscribers::SubscriberSet,
    tasks::{Args, JobRef, Task, TaskId, TaskIdGenerator},
};

struct Pool {
    queue: Arc<BoundedQueue<Task>>,
    workers: JoinSet<WorkerExit>,
    token: CancellationToken,
}

enum State {
    NotStarted,
    Running(Pool),
    Stopped,
}

/// Fixed-size pool of workers consuming a bounded FIFO queue of tasks.
///
/// Dropping a running factory aborts its workers without draining.
pub struct Factory {
    cfg: FactoryConfig,
    bus: Bus,
    tracker: Arc<WorkerTracker>,
    ids: TaskIdGenerator,
    state: Mutex<State>,
    listener: CancellationToken,
    delivery: Mutex<Option<JoinHandle<()>>>,
}

impl Factory {
    /// Builds a factory without subscribers; starts it if `cfg.autostart` is set.
    ///
    /// Must be called within a Tokio runtime.
    pub fn new(cfg: FactoryConfig) -> Self {
        FactoryBuilder::new(cfg).build()
    }

    /// Returns a builder for attaching subscribers before construction.
    pub fn builder(cfg: FactoryConfig) -> FactoryBuilder {
        FactoryBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: FactoryConfig, bus: Bus, subs: SubscriberSet) -> Self {
        let tracker = Arc::new(WorkerTracker::new());
        let listener = CancellationToken::new();
        let delivery = Self::subscriber_listener(
            bus.subscribe(),
            Arc::clone(&tracker),
            subs,
            listener.clone(),
        );
        Self {
            cfg,
            bus,
            tracker,
            ids: TaskIdGenerator::new(),
            state: Mutex::new(State::NotStarted),
            listener,
            delivery: Mutex::new(Some(delivery)),
        }
    }

    /// Forwards bus events to the tracker, then to the subscribers.
    ///
    /// Once `stop` fires, forwards whatever the bus still holds and closes the
    /// subscriber set, waiting for it to deliver everything queued.
    fn subscriber_listener(
        mut rx: broadcast::Receiver<Event>,
        tracker: Arc<WorkerTracker>,
        subs: SubscriberSet,
        stop: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let res = select! {
                    biased;
                    res = rx.recv() => res,
                    _ = stop.cancelled() => break,
                };
                match res {
                    Ok(ev) => {
                        tracker.update(&ev).await;
                        subs.emit(ev);
                    }
                    Err(RecvError::Lagged(skipped)) => subs.emit(listener_lagged(skipped)),
                    Err(RecvError::Closed) => break,
                }
            }

            loop {
                match rx.try_recv() {
                    Ok(ev) => {
                        tracker.update(&ev).await;
                        subs.emit(ev);
                    }
                    Err(TryRecvError::Lagged(skipped)) => subs.emit(listener_lagged(skipped)),
                    Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                }
            }
            subs.shutdown().await;
        })
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns the workers.
    ///
    /// No-op when already running; [`RuntimeError::AlreadyStopped`] once stopped.
    /// Must be called within a Tokio runtime.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut state = self.lock();
        match &*state {
            State::Running(_) => return Ok(()),
            State::Stopped => return Err(RuntimeError::AlreadyStopped),
            State::NotStarted => {}
        }
        *state = State::Running(self.spawn_pool());
        Ok(())
    }

    fn spawn_pool(&self) -> Pool {
        let size = self.cfg.worker_count();
        let capacity = self.cfg.queue_capacity();
        let queue = Arc::new(BoundedQueue::new(capacity));
        let token = CancellationToken::new();

        self.bus.publish(
            Event::new(EventKind::FactoryStarted)
                .with_reason(format!("size={size} capacity={capacity}")),
        );

        let mut workers = JoinSet::new();
        for idx in 0..size {
            let worker = Worker::new(idx, Arc::clone(&queue), self.bus.clone());
            workers.spawn(worker.run(token.child_token()));
        }
        Pool {
            queue,
            workers,
            token,
        }
    }

    /// Submits `job` with `args` and returns the new task's id.
    ///
    /// Waits while the queue holds `max_queue_size` unfinished tasks.
    ///
    /// # Errors
    /// - [`RuntimeError::NotStarted`] before [`start`](Self::start)
    /// - [`RuntimeError::SubmissionClosed`] once shutdown or termination began
    pub async fn run(&self, job: &JobRef, args: Args) -> Result<TaskId, RuntimeError> {
        let queue = match &*self.lock() {
            State::NotStarted => return Err(RuntimeError::NotStarted),
            State::Running(pool) => Some(Arc::clone(&pool.queue)),
            State::Stopped => None,
        };

        let task = Task::new(self.ids.next(), Arc::clone(job), args);
        let id = task.id();
        let label = task.to_string();
        self.bus.publish(
            Event::new(EventKind::TaskScheduled)
                .with_task_id(id)
                .with_task(label.as_str()),
        );

        let res = match queue {
            Some(queue) => queue.put(task).await,
            None => Err(QueueError::Closed),
        };
        if let Err(e) = res {
            self.bus.publish(
                Event::new(EventKind::TaskRejected)
                    .with_task_id(id)
                    .with_task(label)
                    .with_reason(e.to_string()),
            );
            return Err(RuntimeError::SubmissionClosed { task_id: id });
        }
        Ok(id)
    }

    /// Stops accepting tasks, waits for every accepted task to finish, then
    /// stops the workers.
    ///
    /// Returns `Ok(())` immediately if already stopped.
    ///
    /// # Errors
    /// - [`RuntimeError::NotStarted`] before [`start`](Self::start)
    /// - [`RuntimeError::DrainInterrupted`] if [`terminate`](Self::terminate) runs meanwhile
    /// - [`RuntimeError::GraceExceeded`] from the final termination
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (queue, token) = match &*self.lock() {
            State::NotStarted => return Err(RuntimeError::NotStarted),
            State::Stopped => return Ok(()),
            State::Running(pool) => (Arc::clone(&pool.queue), pool.token.clone()),
        };

        self.bus.publish(
            Event::new(EventKind::ShutdownRequested).with_queued(queue.unfinished()),
        );
        queue.close();

        select! {
            _ = queue.join() => {},
            _ = token.cancelled() => return Err(RuntimeError::DrainInterrupted),
        }
        self.bus.publish(Event::new(EventKind::DrainCompleted));

        self.terminate().await
    }

    /// Stops the workers now, abandoning queued and running tasks.
    ///
    /// Running jobs are dropped at their next await point. Workers still alive
    /// after [`FactoryConfig::grace`] are aborted.
    ///
    /// Returns `Ok(())` immediately if already stopped.
    ///
    /// # Errors
    /// - [`RuntimeError::NotStarted`] before [`start`](Self::start)
    /// - [`RuntimeError::GraceExceeded`] with the stuck workers' activity
    pub async fn terminate(&self) -> Result<(), RuntimeError> {
        let pool = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, State::Stopped) {
                State::Running(pool) => pool,
                State::Stopped => return Ok(()),
                State::NotStarted => {
                    *state = State::NotStarted;
                    return Err(RuntimeError::NotStarted);
                }
            }
        };

        self.bus.publish(
            Event::new(EventKind::TerminateRequested).with_queued(pool.queue.len()),
        );
        pool.queue.close();
        pool.token.cancel();
        let res = self.wait_all_with_grace(pool.workers).await;
        self.flush_subscribers().await;
        res
    }

    /// Stops the listener after it has forwarded every published event and
    /// waits (at most `grace`) for subscribers to process them.
    async fn flush_subscribers(&self) {
        self.listener.cancel();
        let delivery = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = delivery {
            let _ = tokio::time::timeout(self.cfg.grace, handle).await;
        }
    }

    /// Waits for all workers to exit within the configured grace period.
    async fn wait_all_with_grace(
        &self,
        mut workers: JoinSet<WorkerExit>,
    ) -> Result<(), RuntimeError> {
        let grace = self.cfg.grace;
        let done = async { while workers.join_next().await.is_some() {} };

        match tokio::time::timeout(grace, done).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllWorkersStopped));
                Ok(())
            }
            Err(_) => {
                workers.abort_all();
                let stuck = self.tracker.snapshot().await;
                self.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(stuck.join("; ")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then shuts down gracefully.
    ///
    /// # Errors
    /// - [`RuntimeError::Signal`] if the signal listeners cannot be installed
    /// - anything [`shutdown`](Self::shutdown) returns
    pub async fn shutdown_on_signal(&self) -> Result<(), RuntimeError> {
        shutdown::wait_for_shutdown_signal()
            .await
            .map_err(RuntimeError::Signal)?;
        self.shutdown().await
    }

    /// Configured number of workers (sentinel resolved).
    pub fn size(&self) -> usize {
        self.cfg.worker_count()
    }

    /// Configured queue capacity (sentinel resolved).
    pub fn max_queue_size(&self) -> usize {
        self.cfg.queue_capacity()
    }

    /// Configuration the factory was built with (sentinels unresolved).
    pub fn config(&self) -> &FactoryConfig {
        &self.cfg
    }

    /// `true` between `start()` and the beginning of termination.
    pub fn is_running(&self) -> bool {
        matches!(&*self.lock(), State::Running(_))
    }

    /// Workers whose loop has not exited yet.
    ///
    /// Workers that already left their loop (e.g. after `WorkerDead`) are
    /// reaped first, so they are not counted.
    pub fn worker_count(&self) -> usize {
        match &mut *self.lock() {
            State::Running(pool) => {
                while pool.workers.try_join_next().is_some() {}
                pool.workers.len()
            }
            _ => 0,
        }
    }

    /// Tasks waiting in the queue (excludes running ones).
    pub fn queued(&self) -> usize {
        match &*self.lock() {
            State::Running(pool) => pool.queue.len(),
            _ => 0,
        }
    }

    /// Most recently allocated task id (`0` if none).
    pub fn last_task_id(&self) -> TaskId {
        self.ids.last()
    }

    /// Workers currently running a task, as seen through events.
    pub async fn busy_workers(&self) -> usize {
        self.tracker.busy().await
    }

    /// Subscribes directly to the internal event bus.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}

fn listener_lagged(skipped: u64) -> Event {
    Event::new(EventKind::SubscriberOverflow)
        .with_task("factory-listener")
        .with_reason(format!("lagged behind the bus, skipped={skipped}"))
}

impl Drop for Factory {
    fn drop(&mut self) {
        self.listener.cancel();
        if let State::Running(pool) = &*self.lock() {
            pool.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobFn, TaskError};
    use std::time::Duration;
    use tokio::time::timeout;

    fn noop() -> JobRef {
        JobFn::arc("noop", |_a: Args, _c: CancellationToken| async {
            Ok::<_, TaskError>(())
        })
    }

    fn manual(size: usize) -> Factory {
        Factory::new(FactoryConfig {
            autostart: false,
            ..FactoryConfig::with_size(size)
        })
    }

    #[tokio::test]
    async fn lifecycle_transitions() {
        let f = manual(2);
        assert!(!f.is_running());
        assert!(matches!(
            f.run(&noop(), Args::new()).await,
            Err(RuntimeError::NotStarted)
        ));
        assert!(matches!(f.shutdown().await, Err(RuntimeError::NotStarted)));
        assert!(matches!(f.terminate().await, Err(RuntimeError::NotStarted)));
        // Nothing was allocated for the refused submission.
        assert_eq!(f.last_task_id(), 0);

        f.start().expect("start");
        f.start().expect("second start is a no-op");
        assert!(f.is_running());
        assert_eq!(f.worker_count(), 2);

        f.shutdown().await.expect("shutdown");
        assert!(!f.is_running());
        assert_eq!(f.worker_count(), 0);
        assert!(matches!(f.start(), Err(RuntimeError::AlreadyStopped)));
        f.shutdown().await.expect("shutdown twice");
        f.terminate().await.expect("terminate after shutdown");
    }

    #[tokio::test]
    async fn rejected_submission_keeps_its_id() {
        let f = Factory::new(FactoryConfig::with_size(1));
        let first = f.run(&noop(), Args::new()).await.expect("run");
        assert_eq!(first, 1);
        f.terminate().await.expect("terminate");

        match f.run(&noop(), Args::new()).await {
            Err(RuntimeError::SubmissionClosed { task_id }) => assert_eq!(task_id, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(f.last_task_id(), 2);
    }

    #[tokio::test]
    async fn terminate_interrupts_drain() {
        let f = Arc::new(Factory::new(FactoryConfig::with_size(1)));
        let slow: JobRef = JobFn::arc("slow", |_a: Args, _c: CancellationToken| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, TaskError>(())
        });
        f.run(&slow, Args::new()).await.expect("run");

        let drain = tokio::spawn({
            let f = Arc::clone(&f);
            async move { f.shutdown().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.terminate().await.expect("terminate");

        let res = timeout(Duration::from_secs(2), drain)
            .await
            .expect("drain still waiting")
            .expect("drain panicked");
        assert!(matches!(res, Err(RuntimeError::DrainInterrupted)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn grace_exceeded_names_stuck_worker() {
        let f = Factory::new(FactoryConfig {
            grace: Duration::from_millis(100),
            ..FactoryConfig::with_size(1)
        });
        let mut rx = f.events();
        // Blocks its thread, so cancellation cannot reach it.
        let stubborn: JobRef = JobFn::arc("stubborn", |_a: Args, _c: CancellationToken| async {
            tokio::task::block_in_place(|| std::thread::sleep(Duration::from_millis(400)));
            Ok::<_, TaskError>(())
        });
        f.run(&stubborn, Args::new()).await.expect("run");

        loop {
            let ev = rx.recv().await.expect("bus closed");
            if ev.kind == EventKind::TaskAccepted {
                break;
            }
        }

        match f.terminate().await {
            Err(RuntimeError::GraceExceeded { stuck, .. }) => {
                assert_eq!(stuck, vec!["worker-0: running <Task #1: stubborn()>"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    #[async_trait::async_trait]
    impl crate::Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.0.lock().unwrap().push(ev.clone());
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn lagging_listener_reports_overflow() {
        let rec = Arc::new(Recorder::default());
        let f = Factory::builder(FactoryConfig {
            autostart: false,
            bus_capacity: 1,
            ..FactoryConfig::with_size(1)
        })
        .subscriber(rec.clone())
        .build();

        // No await in between, so the listener falls behind.
        for _ in 0..10 {
            f.bus.publish(Event::new(EventKind::WorkerIdle));
        }

        timeout(Duration::from_secs(2), async {
            while !rec
                .0
                .lock()
                .unwrap()
                .iter()
                .any(|e| e.kind == EventKind::SubscriberOverflow)
            {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("lag never reported");

        let events = rec.0.lock().unwrap().clone();
        let lag = events
            .iter()
            .find(|e| e.kind == EventKind::SubscriberOverflow)
            .expect("overflow event");
        assert_eq!(lag.task.as_deref(), Some("factory-listener"));
        assert!(lag.reason.as_deref().unwrap_or("").contains("skipped="));
    }

    #[tokio::test]
    async fn dead_workers_are_not_counted() {
        let f = Factory::new(FactoryConfig::with_size(1));
        let mut rx = f.events();
        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let gated: JobRef = {
            let gate = Arc::clone(&gate);
            JobFn::arc("gated", move |_a: Args, _c: CancellationToken| {
                let gate = Arc::clone(&gate);
                async move {
                    let _permit = gate.acquire().await.map_err(TaskError::fail)?;
                    Ok::<_, TaskError>(())
                }
            })
        };
        f.run(&gated, Args::new()).await.expect("run");
        loop {
            if rx.recv().await.expect("bus closed").kind == EventKind::TaskAccepted {
                break;
            }
        }

        // Take the running task's claim so the worker's own mark_done fails.
        let queue = match &*f.lock() {
            State::Running(pool) => Arc::clone(&pool.queue),
            _ => panic!("factory not running"),
        };
        queue.mark_done().expect("claimed");
        gate.add_permits(1);
        loop {
            if rx.recv().await.expect("bus closed").kind == EventKind::WorkerDead {
                break;
            }
        }

        timeout(Duration::from_secs(2), async {
            while f.worker_count() != 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("dead worker still counted");
        assert!(f.is_running());
    }
}
