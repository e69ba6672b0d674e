//! Graph snapshot and its builder.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::clients::{aggregate_clients, MeshWalk};
use crate::gateway::{resolve_gateway_path, GatewayPath};
use crate::{Error, Link, LinkRecord, Node, NodeId, Result};

/// One immutable snapshot of the mesh.
///
/// Built wholesale on every data refresh and never mutated afterwards, so it
/// can be shared between any number of readers.
#[derive(Debug, Clone, Default)]
pub struct MeshGraph {
    nodes: BTreeMap<NodeId, Node>,
    neighbours: HashMap<NodeId, Vec<Link>>,
    gateways: BTreeSet<NodeId>,
    link_count: usize,
}

impl MeshGraph {
    /// Start assembling a snapshot.
    pub fn builder() -> MeshGraphBuilder {
        MeshGraphBuilder::default()
    }

    /// Build a snapshot from its parts in one call.
    pub fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        links: impl IntoIterator<Item = LinkRecord>,
        gateways: impl IntoIterator<Item = NodeId>,
    ) -> Result<Self> {
        let mut builder = Self::builder();
        for node in nodes {
            builder = builder.node(node)?;
        }
        for link in links {
            builder = builder.link(link);
        }
        for gateway in gateways {
            builder = builder.gateway(gateway);
        }
        Ok(builder.build())
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, ordered by identifier.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of link records the snapshot was built from.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    /// Neighbour edges held by a node. Empty for unknown nodes.
    pub fn neighbours(&self, id: &NodeId) -> &[Link] {
        self.neighbours.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The node at the far end of a link, if it is part of the snapshot.
    pub fn resolve(&self, link: &Link) -> Option<&Node> {
        self.nodes.get(&link.neighbour)
    }

    /// Number of non-tunnel neighbour edges of a node.
    pub fn mesh_links(&self, id: &NodeId) -> usize {
        self.neighbours(id).iter().filter(|link| !link.is_tunnel()).count()
    }

    /// Look up a node in the gateways index.
    pub fn gateway(&self, id: &NodeId) -> Option<&Node> {
        if self.gateways.contains(id) {
            self.nodes.get(id)
        } else {
            None
        }
    }

    /// All known gateways, ordered by identifier.
    pub fn gateways(&self) -> impl Iterator<Item = &Node> {
        self.gateways.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Nodes reachable from `id` over non-tunnel links, including `id` itself.
    pub fn reachable(&self, id: &NodeId) -> BTreeSet<&NodeId> {
        MeshWalk::new(self, id).map(|node| &node.id).collect()
    }

    /// Own clients plus those of every node behind it on the local mesh.
    pub fn aggregate_clients(&self, id: &NodeId) -> u64 {
        aggregate_clients(self, id)
    }

    /// The path from a node's next hop to its selected gateway.
    ///
    /// Empty for unknown nodes.
    pub fn gateway_path(&self, id: &NodeId) -> GatewayPath<'_> {
        match self.nodes.get(id) {
            Some(node) => resolve_gateway_path(self, node),
            None => GatewayPath::default(),
        }
    }
}

/// Assembles a [`MeshGraph`], rejecting duplicate identifiers.
#[derive(Debug, Default)]
pub struct MeshGraphBuilder {
    nodes: BTreeMap<NodeId, Node>,
    links: Vec<LinkRecord>,
    link_ids: HashSet<String>,
    gateways: Vec<NodeId>,
}

impl MeshGraphBuilder {
    /// Add a node.
    pub fn node(mut self, node: Node) -> Result<Self> {
        if node.id.is_empty() {
            return Err(Error::EmptyNodeId);
        }
        if self.nodes.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(self)
    }

    /// Add a link. Endpoints are resolved when the graph is built.
    ///
    /// A link without an identifier is named `{source}-{target}`. Of several
    /// links sharing an identifier only the first is kept.
    pub fn link(mut self, mut link: LinkRecord) -> Self {
        if link.id.is_empty() {
            link.id = format!("{}-{}", link.source, link.target);
        }
        if !self.link_ids.insert(link.id.clone()) {
            warn!(link = %link.id, "ignoring duplicate link");
            return self;
        }
        self.links.push(link);
        self
    }

    /// List a node as a gateway in addition to those flagged as one.
    pub fn gateway(mut self, id: impl Into<NodeId>) -> Self {
        self.gateways.push(id.into());
        self
    }

    /// Finish the snapshot.
    ///
    /// A link whose endpoint is missing from the snapshot is kept on the
    /// known side as a dangling edge; a link with no known endpoint is
    /// dropped.
    pub fn build(self) -> MeshGraph {
        let Self {
            nodes,
            links,
            gateways: listed,
            ..
        } = self;

        let mut neighbours: HashMap<NodeId, Vec<Link>> = HashMap::new();
        let mut link_count = 0;
        for record in &links {
            let has_source = nodes.contains_key(&record.source);
            let has_target = nodes.contains_key(&record.target);
            if !has_source && !has_target {
                warn!(link = %record.id, "dropping link without known endpoints");
                continue;
            }
            if has_source {
                neighbours
                    .entry(record.source.clone())
                    .or_default()
                    .push(record.outgoing());
            }
            if has_target {
                neighbours
                    .entry(record.target.clone())
                    .or_default()
                    .push(record.incoming());
            }
            link_count += 1;
        }

        let mut gateways: BTreeSet<NodeId> = nodes
            .values()
            .filter(|node| node.flags.gateway)
            .map(|node| node.id.clone())
            .collect();
        for id in listed {
            if nodes.contains_key(&id) {
                gateways.insert(id);
            } else {
                warn!(gateway = %id, "listed gateway is not part of the snapshot");
            }
        }

        debug!(
            nodes = nodes.len(),
            links = link_count,
            gateways = gateways.len(),
            "built mesh graph"
        );

        MeshGraph {
            nodes,
            neighbours,
            gateways,
            link_count,
        }
    }
}
