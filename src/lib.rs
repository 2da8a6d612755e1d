//! # taskfactory
//!
//! **Taskfactory** is a fixed-size worker pool ("factory") for async jobs.
//!
//! Callers submit a job together with its arguments; the factory wraps them in
//! a [`Task`] with a unique id and puts it on a bounded FIFO queue. A fixed
//! number of workers pull tasks off the queue and run them concurrently. A
//! failing or panicking task is reported and never takes its worker down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producer A          producer B          producer C
//!  run(job, args)      run(job, args)      run(job, args)
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Factory (runtime controller)                                     │
//! │  - TaskIdGenerator (monotonic ids, starting at 1)                 │
//! │  - BoundedQueue<Task> (FIFO, capacity = max_queue_size)           │
//! │  - Bus (broadcast events)                                         │
//! │  - WorkerTracker (what each worker is doing, by sequence number)  │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   Worker 0   │   │   Worker 1   │   │  Worker N-1  │   │
//!     │ (get/run/done│   │ (get/run/done│   │ (get/run/done│   │
//!     │     loop)    │   │     loop)    │   │     loop)    │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - TaskAccepted   │                  │                 │
//!      │ - TaskCompleted  │                  │                 │
//!      │ - TaskFailed     │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                (capacity: FactoryConfig::bus_capacity)            │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                         ┌───────────────────┐
//!                         │ factory listener  │
//!                         └───┬───────────┬───┘
//!                             ▼           ▼
//!                     WorkerTracker   SubscriberSet
//!                                  ┌──────┼──────┐
//!                                  ▼      ▼      ▼
//!                               sub1   sub2   subN .on_event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! Factory::new(cfg) ──(autostart)──► start() ──► spawn `size` workers
//!
//! run(job, args):
//!   ├─► id = ids.next()
//!   ├─► publish TaskScheduled
//!   └─► queue.put(task)         waits while max_queue_size tasks are unfinished
//!
//! worker loop {
//!   ├─► task = queue.get()      FIFO, one worker per task
//!   ├─► publish TaskAccepted
//!   ├─► run_task(task)
//!   │       ├─ Ok     ─► TaskCompleted
//!   │       ├─ Err(e) ─► TaskFailed{reason = e}
//!   │       └─ panic  ─► TaskFailed{reason = "panicked: ..."}
//!   └─► queue.mark_done()
//! }
//!
//! shutdown():  close queue ─► wait until every accepted task is done ─► terminate()
//! terminate(): close queue ─► cancel workers ─► wait up to grace ─► abort leftovers
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Factory**       | Worker pool lifecycle, submission, drain and termination.     | [`Factory`], [`FactoryBuilder`]            |
//! | **Jobs & tasks**  | Reusable async jobs, invoked once per task with its args.     | [`Job`], [`JobFn`], [`JobRef`], [`Task`]   |
//! | **Queue**         | Bounded FIFO with completion tracking and `join()`.           | [`BoundedQueue`]                           |
//! | **Subscriber API**| Hook into factory events (logging, metrics, custom sinks).    | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed errors for the runtime, tasks and the queue.            | [`RuntimeError`], [`TaskError`], [`QueueError`] |
//! | **Configuration** | Pool size, queue capacity, grace period.                      | [`FactoryConfig`]                          |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber, which
//!   forwards events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskfactory::{Args, Factory, FactoryConfig, JobFn, JobRef, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskfactory::Subscribe>> = vec![Arc::new(taskfactory::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskfactory::Subscribe>> = Vec::new();
//!
//!     let factory = Factory::builder(FactoryConfig::with_size(4))
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let greet: JobRef = JobFn::arc("greet", |args: Args, _ctx: CancellationToken| async move {
//!         println!("hello, {}", args.kw("name").and_then(|v| v.as_str()).unwrap_or("world"));
//!         Ok::<_, TaskError>(())
//!     });
//!
//!     for name in ["ada", "grace", "linus"] {
//!         factory.run(&greet, Args::new().kwarg("name", name)).await?;
//!     }
//!     factory.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod queue;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Factory, FactoryBuilder, FactoryConfig};
pub use error::{QueueError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use queue::BoundedQueue;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Args, BoxJobFuture, Job, JobFn, JobRef, Task, TaskId, TaskIdGenerator};

// Built-in tracing subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
