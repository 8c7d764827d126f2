//! Configuration model for the connector daemon.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{ConnectorError, Result};

/// Root configuration for the connector daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Path of the unix-domain socket the daemon binds.
    pub socket_path: PathBuf,
    /// Peer sockets the watchdog probes. Empty disables the watchdog.
    pub watchdog_sockets: Vec<PathBuf>,
    /// Seconds between two watchdog rounds.
    pub watchdog_interval_secs: u64,
    /// Consecutive failures after which a peer counts as dead.
    pub watchdog_threshold: u32,
    /// Upper bound on concurrently handled connections.
    pub max_connections: usize,
    /// Seconds a client may stay silent before being dropped.
    pub read_timeout_secs: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(constants::DEFAULT_SOCKET_PATH),
            watchdog_sockets: Vec::new(),
            watchdog_interval_secs: constants::DEFAULT_WATCHDOG_INTERVAL_SECS,
            watchdog_threshold: constants::DEFAULT_WATCHDOG_THRESHOLD,
            max_connections: constants::DEFAULT_MAX_CONNECTIONS,
            read_timeout_secs: constants::DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

impl ConnectorConfig {
    /// Interval between watchdog rounds.
    #[must_use]
    pub const fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }

    /// Read timeout applied to each connection.
    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Config`] when a limit is zero or the
    /// connection cap exceeds [`constants::MAX_CONNECTIONS_LIMIT`].
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ConnectorError::Config {
                message: "max_connections must be at least 1".into(),
            });
        }
        if self.max_connections > constants::MAX_CONNECTIONS_LIMIT {
            return Err(ConnectorError::Config {
                message: format!(
                    "max_connections must be at most {}",
                    constants::MAX_CONNECTIONS_LIMIT
                ),
            });
        }
        if self.watchdog_threshold == 0 {
            return Err(ConnectorError::Config {
                message: "watchdog_threshold must be at least 1".into(),
            });
        }
        if self.watchdog_interval_secs == 0 {
            return Err(ConnectorError::Config {
                message: "watchdog_interval_secs must be at least 1".into(),
            });
        }
        if self.read_timeout_secs == 0 {
            return Err(ConnectorError::Config {
                message: "read_timeout_secs must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Renders the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Splits a comma-separated socket list such as the value of
/// `WATCHDOG_SOCKETS_PATH`.
///
/// Entries are trimmed, empty entries are skipped and repeated entries are
/// kept once, so an empty value yields an empty list.
#[must_use]
pub fn parse_socket_list(raw: &str) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && seen.insert(*entry))
        .map(PathBuf::from)
        .collect()
}
