//! Gateway path resolution.
//!
//! Each node reports the gateway it selected and its next hop toward it.
//! The path is rebuilt by following next hops for as long as every node on
//! the way reports the same gateway. Stale or contradictory telemetry ends
//! the walk early instead of producing a wrong path, and the walk never
//! follows more than [`MAX_GATEWAY_HOPS`] pointers.

use std::fmt;

use tracing::trace;

use crate::{MeshGraph, Node, NodeId, HOP_SEPARATOR, MAX_GATEWAY_HOPS, TRUNCATION_MARKER};

/// One entry of a gateway path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hop<'g> {
    /// A node present in the snapshot
    Node(&'g Node),
    /// A reference that does not resolve; carries the raw identifier
    Unknown(&'g NodeId),
    /// Hops beyond the traversal bound were not resolved
    Truncated,
}

impl<'g> Hop<'g> {
    /// Identifier of the hop, `None` for the truncation marker.
    pub fn id(&self) -> Option<&'g NodeId> {
        match *self {
            Hop::Node(node) => Some(&node.id),
            Hop::Unknown(id) => Some(id),
            Hop::Truncated => None,
        }
    }

    /// The resolved node, if any.
    pub fn node(&self) -> Option<&'g Node> {
        match *self {
            Hop::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Hop::Truncated)
    }
}

impl fmt::Display for Hop<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hop::Node(node) => f.write_str(node.display_name()),
            Hop::Unknown(id) => write!(f, "{}", id),
            Hop::Truncated => f.write_str(TRUNCATION_MARKER),
        }
    }
}

/// Why the walk toward the gateway stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PathEnd {
    /// The node reports no gateway
    #[default]
    NoGateway,
    /// The node reports a gateway but no next hop
    NoNextHop,
    /// The next hop chain arrived at the gateway
    Reached,
    /// A next hop is not part of the snapshot
    Broken,
    /// A next hop reports a different gateway, or none
    Diverged,
    /// A next hop reports no next hop of its own
    DeadEnd,
    /// The hop bound was hit before arriving at the gateway
    Truncated,
}

impl PathEnd {
    /// True if the path runs all the way from the next hop to the gateway.
    pub fn is_complete(&self) -> bool {
        matches!(self, PathEnd::Reached | PathEnd::NoNextHop)
    }
}

/// Hops from a node's next hop to its gateway, nearest first.
///
/// The gateway is always the last hop when one is reported.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GatewayPath<'g> {
    hops: Vec<Hop<'g>>,
    end: PathEnd,
}

impl<'g> GatewayPath<'g> {
    pub fn hops(&self) -> &[Hop<'g>] {
        &self.hops
    }

    pub fn end(&self) -> PathEnd {
        self.end
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn is_truncated(&self) -> bool {
        self.end == PathEnd::Truncated
    }

    /// The final hop: the gateway itself.
    pub fn gateway(&self) -> Option<&Hop<'g>> {
        self.hops.last()
    }
}

impl fmt::Display for GatewayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                f.write_str(HOP_SEPARATOR)?;
            }
            write!(f, "{}", hop)?;
        }
        Ok(())
    }
}

/// Resolve the path `node`'s gateway traffic takes.
///
/// The selected gateway is looked up in the snapshot's gateways index; next
/// hops are looked up among all nodes. References that do not resolve
/// become [`Hop::Unknown`].
pub fn resolve_gateway_path<'g>(graph: &'g MeshGraph, node: &'g Node) -> GatewayPath<'g> {
    let Some(gateway) = node.statistics.gateway.as_ref() else {
        return GatewayPath::default();
    };
    let target = graph.gateway(gateway).map_or(Hop::Unknown(gateway), Hop::Node);

    let Some(mut next) = node.statistics.preferred_nexthop() else {
        return GatewayPath {
            hops: vec![target],
            end: PathEnd::NoNextHop,
        };
    };

    let mut hops = Vec::new();
    let end = loop {
        if next == gateway {
            break PathEnd::Reached;
        }
        if hops.len() == MAX_GATEWAY_HOPS {
            hops.push(Hop::Truncated);
            trace!(node = %node.id, gateway = %gateway, "gateway path truncated");
            break PathEnd::Truncated;
        }

        let Some(hop) = graph.node(next) else {
            hops.push(Hop::Unknown(next));
            break PathEnd::Broken;
        };
        hops.push(Hop::Node(hop));

        if hop.statistics.gateway.as_ref() != Some(gateway) {
            break PathEnd::Diverged;
        }
        match hop.statistics.preferred_nexthop() {
            Some(id) => next = id,
            None => break PathEnd::DeadEnd,
        }
    };

    hops.push(target);
    GatewayPath { hops, end }
}
