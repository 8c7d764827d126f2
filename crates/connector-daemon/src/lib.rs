//! # connector-daemon
//!
//! The long-running half of the connector:
//! - **Server**: binds the unix socket and dispatches each connection to
//!   its own task.
//! - **Handler**: one request, one response per connection.
//! - **Watchdog**: probes peer sockets and reports when all of them are gone.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod handler;
pub mod probe;
pub mod server;
pub mod watchdog;

use connector_common::config::ConnectorConfig;
use connector_common::error::{ConnectorError, Result};
use connector_core::executor::CommandRunner;

use crate::probe::UnixSocketProbe;
use crate::server::Server;
use crate::watchdog::{RoundSummary, Watchdog};

/// Runs the daemon until the watchdog finds every peer socket dead.
///
/// Binds the socket, starts the accept loop and, when peer sockets are
/// configured, the watchdog. Without peers this only returns on a task
/// failure.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the socket cannot be
/// bound, or a background task panics.
pub async fn run<R: CommandRunner>(config: &ConnectorConfig, runner: R) -> Result<RoundSummary> {
    config.validate()?;
    let server = Server::bind(config, runner)?;
    let mut server_task = tokio::spawn(server.run());

    let mut watchdog_task = match Watchdog::from_config(config, UnixSocketProbe) {
        Some(watchdog) => {
            tracing::info!(peers = watchdog.peer_count(), "watchdog started");
            tokio::spawn(watchdog.run())
        }
        None => {
            tracing::info!("watchdog disabled, no peer sockets configured");
            tokio::spawn(std::future::pending::<RoundSummary>())
        }
    };

    tokio::select! {
        joined = &mut server_task => {
            watchdog_task.abort();
            Err(ConnectorError::Task {
                message: match joined {
                    Ok(()) => "server loop stopped".into(),
                    Err(e) => format!("server loop failed: {e}"),
                },
            })
        }
        joined = &mut watchdog_task => {
            server_task.abort();
            joined.map_err(|e| ConnectorError::Task {
                message: format!("watchdog failed: {e}"),
            })
        }
    }
}
