//! Links between mesh nodes.
//!
//! A snapshot lists each link once as a [`LinkRecord`] between a source and a
//! target. The graph turns every record into two [`Link`]s, one held by each
//! endpoint, so traversals only ever look at a node's own neighbour list.

use crate::NodeId;

/// Link types that are tunnels even when the `vpn` flag is not set.
pub const TUNNEL_LINK_TYPES: [&str; 3] = ["vpn", "tunnel", "l2tp"];

/// A link as listed in a snapshot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkRecord {
    /// Stable link identifier; an empty id is named after the endpoints
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    /// Link quality as seen by the source (0..1)
    #[cfg_attr(feature = "serde", serde(default))]
    pub source_tq: Option<f64>,
    /// Link quality as seen by the target (0..1)
    #[cfg_attr(feature = "serde", serde(default))]
    pub target_tq: Option<f64>,
    /// Link type label, e.g. `wifi`, `other`, `vpn`
    #[cfg_attr(feature = "serde", serde(default, rename = "type"))]
    pub link_type: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub vpn: bool,
    /// Distance between the endpoints in metres
    #[cfg_attr(feature = "serde", serde(default))]
    pub distance: Option<f64>,
}

impl LinkRecord {
    /// Create a plain mesh link with unknown quality.
    pub fn new(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_tq: None,
            target_tq: None,
            link_type: String::new(),
            vpn: false,
            distance: None,
        }
    }

    /// Create a tunnel link.
    pub fn tunnel(id: impl Into<String>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            link_type: "vpn".to_string(),
            vpn: true,
            ..Self::new(id, source, target)
        }
    }

    /// Whether this link is a tunnel rather than local mesh adjacency.
    pub fn is_tunnel(&self) -> bool {
        self.vpn || TUNNEL_LINK_TYPES.contains(&self.link_type.as_str())
    }

    /// The edge held by the source, pointing at the target.
    pub(crate) fn outgoing(&self) -> Link {
        Link {
            id: self.id.clone(),
            neighbour: self.target.clone(),
            tunnel: self.is_tunnel(),
            tq: self.source_tq,
            distance: self.distance,
            incoming: false,
            link_type: self.link_type.clone(),
        }
    }

    /// The edge held by the target, pointing back at the source.
    pub(crate) fn incoming(&self) -> Link {
        Link {
            id: self.id.clone(),
            neighbour: self.source.clone(),
            tunnel: self.is_tunnel(),
            tq: self.target_tq,
            distance: self.distance,
            incoming: true,
            link_type: self.link_type.clone(),
        }
    }
}

/// A neighbour edge, seen from the node that holds it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub id: String,
    /// The node at the other end. May not resolve in the snapshot.
    pub neighbour: NodeId,
    tunnel: bool,
    /// Link quality from this side (0..1)
    pub tq: Option<f64>,
    pub distance: Option<f64>,
    /// True if the snapshot listed this node as the link's target
    pub incoming: bool,
    pub link_type: String,
}

impl Link {
    /// The one tunnel predicate every traversal uses.
    pub fn is_tunnel(&self) -> bool {
        self.tunnel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vpn_flag_marks_tunnel() {
        let mut record = LinkRecord::new("l", "a", "b");
        assert!(!record.is_tunnel());
        record.vpn = true;
        assert!(record.is_tunnel());
    }

    #[test]
    fn tunnel_type_marks_tunnel() {
        for ty in TUNNEL_LINK_TYPES {
            let mut record = LinkRecord::new("l", "a", "b");
            record.link_type = ty.to_string();
            assert!(record.is_tunnel(), "{} should be a tunnel", ty);
        }
        let mut wifi = LinkRecord::new("l", "a", "b");
        wifi.link_type = "wifi".to_string();
        assert!(!wifi.is_tunnel());
    }

    #[test]
    fn both_sides_agree_on_tunnel() {
        let record = LinkRecord::tunnel("l", "a", "b");
        assert!(record.outgoing().is_tunnel());
        assert!(record.incoming().is_tunnel());
    }

    #[test]
    fn sides_carry_their_own_quality() {
        let mut record = LinkRecord::new("l", "a", "b");
        record.source_tq = Some(0.9);
        record.target_tq = Some(0.4);

        let out = record.outgoing();
        assert_eq!(out.neighbour, NodeId::from("b"));
        assert_eq!(out.tq, Some(0.9));
        assert!(!out.incoming);

        let back = record.incoming();
        assert_eq!(back.neighbour, NodeId::from("a"));
        assert_eq!(back.tq, Some(0.4));
        assert!(back.incoming);
    }
}
