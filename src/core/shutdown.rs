//! # Controller-side OS signal handling.
//!
//! Workers never see signals; the controller observes them here and turns them
//! into a graceful [`Factory::shutdown`](crate::Factory::shutdown).
//!
//! Unix: `SIGINT`, `SIGTERM`, `SIGQUIT`. Elsewhere: Ctrl-C.

/// Completes when the process receives a termination signal.
///
/// Each call installs independent listeners. Fails only if they cannot be installed.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    platform_signal().await
}

#[cfg(unix)]
async fn platform_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
        _ = quit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn platform_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
