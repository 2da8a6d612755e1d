//! # Job abstraction.
//!
//! A [`Job`] is the callable side of a task: a named, reusable piece of async
//! work that is invoked once per submitted [`Task`](crate::Task) with that
//! task's [`Args`]. The common handle type is [`JobRef`], an `Arc<dyn Job>`
//! shared between the caller and the workers.
//!
//! A job receives a [`CancellationToken`] that is cancelled when the factory
//! terminates. Observing it is optional: a terminated worker drops the job's
//! future at its next await point regardless.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::Args;

/// Boxed future returned by [`Job::call`].
pub type BoxJobFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Shared handle to a job.
pub type JobRef = Arc<dyn Job>;

/// # Asynchronous, reusable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use taskfactory::{Args, BoxJobFuture, Job, TaskError};
///
/// struct Greet;
///
/// impl Job for Greet {
///     fn name(&self) -> &str { "greet" }
///
///     fn call(&self, args: Args, _ctx: CancellationToken) -> BoxJobFuture {
///         Box::pin(async move {
///             let who = args.get(0).and_then(|v| v.as_str()).unwrap_or("world").to_string();
///             println!("hello, {who}");
///             Ok::<(), TaskError>(())
///         })
///     }
/// }
/// ```
pub trait Job: Send + Sync + 'static {
    /// Returns a stable, human-readable job name.
    fn name(&self) -> &str;

    /// Creates a fresh future executing the job with `args`.
    fn call(&self, args: Args, ctx: CancellationToken) -> BoxJobFuture;
}
