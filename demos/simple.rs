//! # Example: simple
//!
//! Four one-second jobs on a factory of four workers, then a graceful shutdown.
//! All four run at once, so the whole program takes about one second.
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example simple
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use taskfactory::{Args, Factory, FactoryConfig, JobFn, JobRef, LogWriter, TaskError};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Up to four tasks at a time.
    let factory = Factory::builder(FactoryConfig::with_size(4))
        .subscriber(Arc::new(LogWriter::new()))
        .build();

    let nap: JobRef = JobFn::arc("do_nothing", |_args: Args, _ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, TaskError>(())
    });

    let started = Instant::now();
    for _ in 0..4 {
        factory.run(&nap, Args::new()).await?;
    }

    // Keeps main from returning while tasks are still running.
    factory.shutdown().await?;
    println!("done in {:.2?}", started.elapsed());
    Ok(())
}
