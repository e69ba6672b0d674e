//! Snapshot documents and the state built from them.

use std::path::Path;

use chrono::{DateTime, Utc};
use meshview_graph::{LinkRecord, MeshGraph, Node, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A mesh snapshot as exported by a data collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the collector produced the snapshot
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    /// Gateways in addition to nodes flagged as one
    #[serde(default)]
    pub gateways: Vec<NodeId>,
}

impl Snapshot {
    /// Parse a snapshot document.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Read and parse a snapshot file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_json(&bytes)
    }

    /// Build the graph. Snapshots without a timestamp are dated now.
    pub fn into_state(self) -> Result<MeshState> {
        let graph = MeshGraph::from_parts(self.nodes, self.links, self.gateways)?;
        Ok(MeshState {
            graph,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

/// A built snapshot, shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct MeshState {
    pub graph: MeshGraph,
    /// Reference time for relative ages and offline uptimes
    pub timestamp: DateTime<Utc>,
}

impl MeshState {
    /// Load a snapshot file and build its graph.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = Snapshot::load(path).await?.into_state()?;
        tracing::info!(
            path = %path.display(),
            nodes = state.graph.len(),
            links = state.graph.link_count(),
            "loaded mesh snapshot"
        );
        Ok(state)
    }

    pub fn online_count(&self) -> usize {
        self.graph.nodes().filter(|n| n.is_online()).count()
    }

    /// Whole seconds between `at` and the snapshot time; positive if `at`
    /// lies in the past.
    pub fn seconds_since(&self, at: DateTime<Utc>) -> i64 {
        (self.timestamp - at).num_seconds()
    }
}
