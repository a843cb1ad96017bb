//! note-trainer-daemon: local harness for the note-guessing skill handler
//!
//! Serves the request handler over a Unix domain socket with length-prefixed
//! JSON frames. The handler is stateless between turns; session state
//! travels in each envelope's attributes and is returned for the caller to
//! persist.

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use note_trainer::config::Config;
use note_trainer::events::GameEvent;
use note_trainer::game::SkillHandler;
use note_trainer::ipc::Server;
use note_trainer::lifecycle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "note-trainer-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    // Channel for game observability events
    let (event_tx, mut event_rx) = broadcast::channel::<GameEvent>(64);

    let mut handler = SkillHandler::from_entropy().with_events(event_tx);
    if let Some(application_id) = config.application_id.clone() {
        info!("application id check enabled");
        handler = handler.with_application_id(application_id);
    }

    let server = Server::new(&config.socket_path, handler)?;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        // Serve request envelopes
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "request server error");
            }
        }

        // Log game events as they happen
        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "game event");
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "game event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("game event logger exited");
        }

        // Wait for shutdown signal
        result = lifecycle::wait_for_shutdown() => {
            match result {
                Ok(()) => info!("shutdown signal received"),
                Err(e) => error!(?e, "signal handler error"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("note-trainer-daemon stopped");

    Ok(())
}
