//! Unified error types for the connector workspace.
//!
//! Higher-level crates define their own domain-specific enums (validation
//! rejections, execution failures, probe failures) and fall back to these
//! variants for infrastructure errors.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The daemon socket could not be bound.
    #[error("failed to bind socket {path}: {source}")]
    Bind {
        /// Socket path the daemon tried to bind.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A background task stopped unexpectedly.
    #[error("background task failed: {message}")]
    Task {
        /// Description of the failure.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConnectorError>;
