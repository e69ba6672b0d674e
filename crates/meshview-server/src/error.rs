//! Error types for meshview-server.

use thiserror::Error;

/// Result type for meshview-server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading snapshots or starting the server.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot is not valid JSON or does not match the expected shape
    #[error("Snapshot parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Snapshot is well formed but inconsistent
    #[error("Graph error: {0}")]
    Graph(#[from] meshview_graph::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}
