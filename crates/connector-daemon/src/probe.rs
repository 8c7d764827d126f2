//! Liveness probes for peer sockets.

use std::future::Future;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a peer socket was judged not alive.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Nothing could be found at the path.
    #[error("socket file {path} is invalid: {source}")]
    Missing {
        /// Probed path.
        path: PathBuf,
        /// Underlying stat error.
        source: std::io::Error,
    },

    /// The path exists but is not a socket.
    #[error("socket file {path} is invalid: not a socket")]
    NotSocket {
        /// Probed path.
        path: PathBuf,
    },

    /// The socket refused the connection.
    #[error("connect to {path} failed: {source}")]
    Connect {
        /// Probed path.
        path: PathBuf,
        /// Underlying connect error.
        source: std::io::Error,
    },
}

/// Checks whether a peer is still serving at a path.
pub trait LivenessProbe: Send + Sync + 'static {
    /// Probes `path` once.
    ///
    /// # Errors
    ///
    /// Returns a [`ProbeError`] describing why the peer is not alive.
    fn probe(&self, path: &Path) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Probe that stats the path and opens a unix-stream connection to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSocketProbe;

impl LivenessProbe for UnixSocketProbe {
    fn probe(&self, path: &Path) -> impl Future<Output = Result<(), ProbeError>> + Send {
        probe_unix_socket(path)
    }
}

/// Succeeds if `path` is a socket file that accepts a connection.
///
/// The connection is closed again right away.
///
/// # Errors
///
/// Returns a [`ProbeError`] if the file is missing, is not a socket, or
/// refuses the connection.
pub async fn probe_unix_socket(path: &Path) -> Result<(), ProbeError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ProbeError::Missing {
            path: path.to_path_buf(),
            source: e,
        })?;
    if !metadata.file_type().is_socket() {
        return Err(ProbeError::NotSocket {
            path: path.to_path_buf(),
        });
    }

    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| ProbeError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
    drop(stream);
    Ok(())
}
