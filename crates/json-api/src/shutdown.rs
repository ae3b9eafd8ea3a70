//! Drains the ordering API when the process is asked to stop.
//!
//! Requests already inside a checkout transaction are given the configured grace period to
//! commit; new connections are refused as soon as a signal arrives.

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
pub(crate) enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),

    #[cfg(windows)]
    #[error("failed to install Windows terminate handler: {0}")]
    Terminate(#[source] io::Error),
}

/// Signal that stopped the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopSignal {
    Interrupt,
    Terminate,
}

impl StopSignal {
    fn as_str(self) -> &'static str {
        match self {
            StopSignal::Interrupt => "interrupt",
            StopSignal::Terminate => "terminate",
        }
    }
}

async fn interrupt() -> Result<StopSignal, ShutdownSignalError> {
    signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC)?;

    Ok(StopSignal::Interrupt)
}

#[cfg(unix)]
async fn terminate() -> Result<StopSignal, ShutdownSignalError> {
    signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(ShutdownSignalError::SigTerm)?
        .recv()
        .await;

    Ok(StopSignal::Terminate)
}

#[cfg(windows)]
async fn terminate() -> Result<StopSignal, ShutdownSignalError> {
    signal::windows::ctrl_close()
        .map_err(ShutdownSignalError::Terminate)?
        .recv()
        .await;

    Ok(StopSignal::Terminate)
}

/// Resolves with whichever stop signal arrives first.
pub(crate) async fn wait_for_signal() -> Result<StopSignal, ShutdownSignalError> {
    tokio::select! {
        signal = interrupt() => signal,
        signal = terminate() => signal,
    }
}

/// Waits for `stop`, then stops accepting connections and drains for at most `grace`.
pub(crate) async fn drain_on<F>(
    handle: ServerHandle,
    grace: Duration,
    stop: F,
) -> Result<StopSignal, ShutdownSignalError>
where
    F: Future<Output = Result<StopSignal, ShutdownSignalError>>,
{
    let signal = stop.await?;

    info!(
        signal = signal.as_str(),
        grace_secs = grace.as_secs(),
        "draining in-flight requests"
    );

    handle.stop_graceful(Some(grace));

    Ok(signal)
}

pub(crate) async fn listen(
    handle: ServerHandle,
    grace: Duration,
) -> Result<StopSignal, ShutdownSignalError> {
    drain_on(handle, grace, wait_for_signal()).await
}
