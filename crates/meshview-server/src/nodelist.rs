//! The "all nodes" table: one summary row per node.

use serde::{Deserialize, Serialize};

use crate::snapshot::MeshState;
use crate::view::{compare_names, missing_last};
use meshview_graph::Node;

/// Summary of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: String,
    pub hostname: Option<String>,
    pub online: bool,
    /// Seconds up if online, negative seconds since last seen if offline
    pub uptime: i64,
    /// Non-tunnel links
    pub meshlinks: usize,
    pub clients: Option<u64>,
    pub loadavg: Option<f64>,
    pub has_location: bool,
}

impl NodeRow {
    pub fn new(state: &MeshState, node: &Node) -> Self {
        Self {
            id: node.id.to_string(),
            hostname: node.hostname.clone(),
            online: node.is_online(),
            uptime: uptime(state, node),
            meshlinks: state.graph.mesh_links(&node.id),
            clients: node.statistics.clients,
            loadavg: node.statistics.loadavg,
            has_location: node.has_location(),
        }
    }

    fn name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.id)
    }
}

fn uptime(state: &MeshState, node: &Node) -> i64 {
    match (node.is_online(), node.statistics.uptime, node.last_seen) {
        (true, Some(up), _) => up.round() as i64,
        (false, _, Some(last_seen)) => -state.seconds_since(last_seen),
        _ => 0,
    }
}

/// Columns the node list sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeSort {
    #[default]
    Name,
    Uptime,
    Links,
    Clients,
    Load,
}

impl NodeSort {
    /// Numeric columns list the largest values first.
    pub fn descending_by_default(&self) -> bool {
        !matches!(self, NodeSort::Name)
    }
}

/// Query over the node list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeListQuery {
    /// Case-insensitive hostname substring
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: NodeSort,
    /// Flip the column's default direction
    #[serde(default)]
    pub reverse: bool,
}

/// Whether a node's hostname contains `query`, ignoring case.
///
/// Nodes without a hostname never match.
pub fn hostname_matches(node: &Node, query: &str) -> bool {
    node.hostname
        .as_deref()
        .is_some_and(|name| name.to_lowercase().contains(&query.to_lowercase()))
}

/// Build, filter and sort the node list.
pub fn node_list(state: &MeshState, query: &NodeListQuery) -> Vec<NodeRow> {
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let mut rows: Vec<_> = state
        .graph
        .nodes()
        .filter(|node| filter.map_or(true, |q| hostname_matches(node, q)))
        .map(|node| NodeRow::new(state, node))
        .collect();

    let key = query.sort;
    let descending = key.descending_by_default() != query.reverse;
    rows.sort_by(|a, b| {
        let ord = match key {
            NodeSort::Name => compare_names(a.name(), b.name()),
            NodeSort::Uptime => a.uptime.cmp(&b.uptime),
            NodeSort::Links => a.meshlinks.cmp(&b.meshlinks),
            NodeSort::Clients => missing_last(a.clients.map(|c| c as f64), b.clients.map(|c| c as f64)),
            NodeSort::Load => missing_last(a.loadavg, b.loadavg),
        };
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    rows
}
