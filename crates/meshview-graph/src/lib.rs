//! Meshview Graph Model
//!
//! In-memory snapshot of a mesh network (nodes, neighbour links, gateways)
//! and the two traversals a dashboard runs against it on every render.
//!
//! # Mesh Clients
//!
//! A node's mesh clients are its own clients plus the clients of every node
//! reachable from it over non-tunnel links. Each reachable node is counted
//! exactly once, whatever cycles or diamonds the mesh contains.
//!
//! # Gateway Path
//!
//! Every node reports the gateway it selected and the next hop it forwards
//! gateway-bound traffic to. Following those next-hop pointers reconstructs
//! the path the traffic takes, as long as the nodes along it agree on the
//! gateway. The walk is bounded to [`MAX_GATEWAY_HOPS`] hops.
//!
//! # Example
//!
//! ```
//! use meshview_graph::{MeshGraph, Node, LinkRecord};
//!
//! let mut a = Node::new("a");
//! a.statistics.clients = Some(2);
//! let mut b = Node::new("b");
//! b.statistics.clients = Some(3);
//!
//! let graph = MeshGraph::builder()
//!     .node(a)?
//!     .node(b)?
//!     .link(LinkRecord::new("a-b", "a", "b"))
//!     .build();
//!
//! assert_eq!(graph.aggregate_clients(&"a".into()), 5);
//! # Ok::<(), meshview_graph::Error>(())
//! ```

mod clients;
mod error;
mod gateway;
mod graph;
mod link;
mod node;

pub use clients::{aggregate_clients, MeshWalk};
pub use error::{Error, Result};
pub use gateway::{resolve_gateway_path, GatewayPath, Hop, PathEnd};
pub use graph::{MeshGraph, MeshGraphBuilder};
pub use link::{Link, LinkRecord, TUNNEL_LINK_TYPES};
pub use node::{Autoupdater, Location, Node, NodeFlags, NodeId, NodeInfo, NodeStatus, Statistics};

/// Maximum number of next-hop pointers followed when resolving a gateway path.
pub const MAX_GATEWAY_HOPS: usize = 10;

/// Separator placed between hops when a gateway path is rendered as text.
pub const HOP_SEPARATOR: &str = " -> ";

/// Text shown in place of the hops a truncated gateway path did not resolve.
pub const TRUNCATION_MARKER: &str = "...";
