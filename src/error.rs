//! Error types for the ferry synchronization engine.

use crate::types::Route;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building trees, talking to a backend or applying a diff.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The transfer source does not exist. Raised before any mutation.
    #[error("{0} does not exist")]
    DoesNotExist(String),

    /// File/directory conflict at a destination route and `force` is off.
    #[error("Type mismatch at \"{route}\": destination entry kind differs from source (use --force to replace it)")]
    Mismatch { route: Route },

    /// The remote tree requires an identity that has not been established.
    #[error("Login required")]
    LoginRequired,

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote backend answered with an unexpected status.
    #[error("Request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// The remote backend answered with something that violates the wire protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),

    /// The diff does not describe the source tree it is applied with.
    #[error("Invalid diff: {0}")]
    InvalidDiff(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}
