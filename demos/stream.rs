//! # Example: stream
//!
//! Submits a steady stream of jobs until Ctrl-C, then drains what was accepted.
//!
//! Shows how to:
//! - share one [`JobRef`] between many submissions with different [`Args`];
//! - keep going when individual tasks fail (roughly one in ten, after the first few);
//! - stop producing on a signal and call [`Factory::shutdown`].
//!
//! ## Flow
//! ```text
//! loop (1000 times, every 100ms):
//!   run(do_something | do_fail, x) ──► queue ──► worker ──► TaskCompleted | TaskFailed
//! Ctrl-C ──► stop producing ──► shutdown() (waits for accepted tasks)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example stream
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use taskfactory::{Args, Factory, FactoryConfig, JobFn, JobRef, LogWriter, TaskError};

fn number(args: &Args) -> u64 {
    args.get(0).and_then(|v| v.as_u64()).unwrap_or_default()
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // One worker per core, three queue slots per worker.
    let factory = Factory::builder(FactoryConfig::default())
        .subscriber(Arc::new(LogWriter::new()))
        .build();

    let work: JobRef = JobFn::arc("do_something", |args: Args, _ctx: CancellationToken| async move {
        let x = number(&args);
        info!("doing something: {x}");
        let pause = rand::rng().random_range(0..5000);
        tokio::time::sleep(Duration::from_millis(pause)).await;
        info!("done: {x}");
        Ok::<_, TaskError>(())
    });

    let fail: JobRef = JobFn::arc("do_fail", |_args: Args, _ctx: CancellationToken| async {
        info!("raising an error in 3.. 2.. 1..");
        Err::<(), _>(TaskError::fail("hey, this is an error!"))
    });

    let produce = async {
        for x in 0..1000u64 {
            let job = if x > 10 && rand::rng().random_bool(0.1) {
                &fail
            } else {
                &work
            };
            info!("scheduling task {x}");
            factory.run(job, Args::new().arg(x)).await?;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok::<_, anyhow::Error>(())
    };

    tokio::select! {
        res = produce => res?,
        _ = tokio::signal::ctrl_c() => info!("shutting down..."),
    }

    factory.shutdown().await?;
    Ok(())
}
