//! # Function-backed job (`JobFn`)
//!
//! [`JobFn`] wraps a closure `F: Fn(Args, CancellationToken) -> Fut`, producing
//! a fresh future per call. The same `JobFn` can be submitted any number of
//! times with different arguments.
//!
//! ## Concurrency semantics
//! - Every call creates a **new** future that owns its state.
//! - Several workers may call the same job at once; shared state goes behind
//!   an explicit `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use taskfactory::{Args, JobFn, JobRef, TaskError};
//!
//! let j: JobRef = JobFn::arc("double", |args: Args, _ctx: CancellationToken| async move {
//!     let n = args.get(0).and_then(|v| v.as_i64()).unwrap_or(0);
//!     println!("{}", n * 2);
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(j.name(), "double");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::Args;
use crate::tasks::job::{BoxJobFuture, Job};

/// Function-backed job implementation.
pub struct JobFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Creates a new function-backed job.
    ///
    /// Prefer [`JobFn::arc`] when you immediately need a [`JobRef`](crate::JobRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the job and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> fmt::Debug for JobFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobFn").field("name", &self.name).finish()
    }
}

impl<F, Fut> Job for JobFn<F>
where
    F: Fn(Args, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: Args, ctx: CancellationToken) -> BoxJobFuture {
        Box::pin((self.f)(args, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobRef;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[tokio::test]
    async fn each_call_gets_its_own_args() {
        let total = Arc::new(AtomicI64::new(0));
        let job: JobRef = {
            let total = Arc::clone(&total);
            JobFn::arc("add", move |args: Args, _ctx: CancellationToken| {
                let total = Arc::clone(&total);
                async move {
                    let n = args.get(0).and_then(|v| v.as_i64()).unwrap_or(0);
                    total.fetch_add(n, Ordering::SeqCst);
                    Ok::<_, TaskError>(())
                }
            })
        };

        let token = CancellationToken::new();
        job.call(Args::new().arg(2), token.clone()).await.unwrap();
        job.call(Args::new().arg(40), token).await.unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 42);
        assert_eq!(job.name(), "add");
    }
}
