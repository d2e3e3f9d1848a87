//! Shutdown coordinator: turns Ctrl-C (and SIGTERM on Unix) into a shutdown
//! request.
//!
//! The handler task only sets the [`ShutdownFlag`].  The server loop notices
//! the flag on its next accept timeout, or once the rumble in progress has
//! finished, and winds down from there.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::application::context::ShutdownFlag;

/// Spawns the signal listener task.
///
/// If the platform refuses to install a signal handler the error is logged
/// and no shutdown is requested; the daemon then runs until killed.
pub fn install_shutdown_handler(flag: ShutdownFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => {
                flag.request();
                info!(signal = name, "shutdown signal received");
            }
            Err(e) => error!("failed to listen for shutdown signals: {e}"),
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
}
