//! Bind point preparation for the daemon socket.

use std::path::Path;

use connector_common::error::{ConnectorError, Result};

/// Makes `socket_path` ready for binding.
///
/// Anything already at the path is a leftover from a previous run and is
/// removed. Otherwise the parent directory is created if it is missing.
///
/// # Errors
///
/// Returns an error if the stale file cannot be removed or the parent
/// directory cannot be created.
pub fn ensure_socket_path(socket_path: &Path) -> Result<()> {
    if std::fs::symlink_metadata(socket_path).is_ok() {
        std::fs::remove_file(socket_path).map_err(|e| ConnectorError::Io {
            path: socket_path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %socket_path.display(), "removed stale socket");
        return Ok(());
    }

    if let Some(parent) = socket_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConnectorError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
            tracing::debug!(path = %parent.display(), "created socket directory");
        }
    }
    Ok(())
}
