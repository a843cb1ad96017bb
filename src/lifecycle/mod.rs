//! Signal handling for graceful shutdown

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tracing::debug;

/// Resolve when SIGTERM or SIGINT arrives
pub async fn wait_for_shutdown() -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            debug!("received SIGTERM");
        }
        _ = sigint.recv() => {
            debug!("received SIGINT");
        }
    }

    Ok(())
}
