//! # Task abstractions.
//!
//! This module provides the task-related types:
//! - [`Job`] - trait for reusable async work invoked with arguments
//! - [`JobFn`] - function-backed job implementation
//! - [`JobRef`] - shared reference to a job (`Arc<dyn Job>`)
//! - [`Args`] - positional and keyword arguments of one call
//! - [`Task`] - immutable record of one submission (id + job + args)
//! - [`TaskIdGenerator`] - monotonic id allocation

mod args;
mod id;
mod job;
mod job_fn;
mod task;

pub use args::Args;
pub use id::{TaskId, TaskIdGenerator};
pub use job::{BoxJobFuture, Job, JobRef};
pub use job_fn::JobFn;
pub use task::Task;
