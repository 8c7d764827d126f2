//! Unix socket server for the connector daemon.
//!
//! Binds one socket and accepts connections forever. Every connection is
//! served on its own task so a slow client cannot stall the others. The
//! number of in-flight connections is capped by a semaphore; when the cap
//! is reached the loop stops accepting until a handler finishes, leaving
//! new clients queued in the listen backlog.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use connector_common::config::ConnectorConfig;
use connector_common::error::{ConnectorError, Result};
use connector_core::executor::CommandRunner;
use connector_core::socket_path::ensure_socket_path;
use tokio::net::UnixListener;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::handler::handle_connection;

/// The bound daemon socket and everything a handler needs.
#[derive(Debug)]
pub struct Server<R> {
    listener: UnixListener,
    socket_path: PathBuf,
    runner: Arc<R>,
    connection_limit: Arc<Semaphore>,
    read_timeout: Duration,
}

impl<R: CommandRunner> Server<R> {
    /// Prepares the socket path and binds the listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Bind`] if the socket cannot be bound.
    pub fn bind(config: &ConnectorConfig, runner: R) -> Result<Self> {
        let socket_path = config.socket_path.clone();
        if let Err(e) = ensure_socket_path(&socket_path) {
            tracing::warn!(error = %e, "could not prepare socket path");
        }
        tracing::info!(path = %socket_path.display(), "socket path is ready");

        let listener = UnixListener::bind(&socket_path).map_err(|e| ConnectorError::Bind {
            path: socket_path.clone(),
            source: e,
        })?;
        tracing::info!(path = %socket_path.display(), "daemon listening");

        Ok(Self {
            listener,
            socket_path,
            runner: Arc::new(runner),
            connection_limit: Arc::new(Semaphore::new(config.max_connections)),
            read_timeout: config.read_timeout(),
        })
    }

    /// Path the listener is bound to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until the task is dropped.
    ///
    /// Accept errors are logged and never end the loop.
    pub async fn run(self) {
        loop {
            let Ok(permit) = Arc::clone(&self.connection_limit).acquire_owned().await else {
                tracing::error!("connection limiter closed");
                return;
            };

            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let runner = Arc::clone(&self.runner);
                    let read_timeout = self.read_timeout;
                    let span = tracing::info_span!("connection", id = %uuid::Uuid::new_v4());
                    let _ = tokio::spawn(
                        async move {
                            let _permit = permit;
                            match handle_connection(stream, runner.as_ref(), read_timeout).await {
                                Ok(response) => {
                                    tracing::debug!(success = response.is_success(), "response sent");
                                }
                                Err(e) => tracing::warn!(error = %e, "connection abandoned"),
                            }
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
