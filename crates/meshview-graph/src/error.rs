//! Error types for meshview-graph.

use thiserror::Error;

use crate::NodeId;

/// Result type for meshview-graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling a graph snapshot.
///
/// The traversals themselves never fail; malformed telemetry degrades to
/// zero counts, empty paths or truncated paths.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Two nodes in one snapshot share an identifier.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// A node was supplied without an identifier.
    #[error("node without id")]
    EmptyNodeId,
}
