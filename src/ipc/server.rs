//! Unix domain socket harness for driving the request handler
//!
//! Clients write length-prefixed JSON request envelopes and read response
//! envelopes back on the same framing. This stands in for the platform's
//! delivery channel during local development.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::game::SkillHandler;

use super::protocol::RequestEnvelope;

/// Largest frame the server will read
const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Socket server feeding envelopes through a shared handler
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    handler: Arc<Mutex<SkillHandler<StdRng>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Bind the socket and take ownership of the handler
    pub fn new(socket_path: &Path, handler: SkillHandler<StdRng>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "request server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            handler: Arc::new(Mutex::new(handler)),
            shutdown_tx,
        })
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let handler = Arc::clone(&self.handler);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, handler) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: UnixStream,
        handler: Arc<Mutex<SkillHandler<StdRng>>>,
    ) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read frame length (4-byte little-endian)
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_FRAME_LEN {
                warn!(len, "frame too large, disconnecting");
                return Ok(());
            }

            let mut msg_buf = vec![0u8; len];
            stream.read_exact(&mut msg_buf).await?;

            let envelope: RequestEnvelope =
                serde_json::from_slice(&msg_buf).context("failed to parse request envelope")?;

            debug!(request_id = %envelope.request.request_id(), "envelope received");

            let outcome = handler.lock().await.handle(&envelope);
            match outcome {
                Ok(Some(response)) => Self::send_frame(&mut stream, &response).await?,
                // Teardown notifications get no response frame
                Ok(None) => debug!("no response for session teardown"),
                // An unsupported intent fails the request outright
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Send a length-prefixed JSON frame
    async fn send_frame<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("request server shutdown complete");
    }
}
