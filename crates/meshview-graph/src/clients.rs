//! Mesh-client aggregation.
//!
//! Clients behind a node are those of every node reachable from it over
//! local (non-tunnel) links. Reachability is walked with an explicit stack
//! and a visited set owned by the walk itself, so the graph is never marked
//! and repeated or concurrent walks over one snapshot cannot interfere.

use std::collections::HashSet;

use crate::{MeshGraph, Node, NodeId};

/// Depth-first walk over the local mesh around a node.
///
/// Yields the start node first and then every node reachable from it over
/// non-tunnel links whose neighbour resolves, each exactly once.
#[derive(Debug)]
pub struct MeshWalk<'g> {
    graph: &'g MeshGraph,
    stack: Vec<&'g Node>,
    visited: HashSet<&'g NodeId>,
}

impl<'g> MeshWalk<'g> {
    /// Walk from `start`. An unknown start yields nothing.
    pub fn new(graph: &'g MeshGraph, start: &NodeId) -> Self {
        Self {
            graph,
            stack: graph.node(start).into_iter().collect(),
            visited: HashSet::new(),
        }
    }
}

impl<'g> Iterator for MeshWalk<'g> {
    type Item = &'g Node;

    fn next(&mut self) -> Option<&'g Node> {
        let graph = self.graph;
        while let Some(node) = self.stack.pop() {
            if !self.visited.insert(&node.id) {
                continue;
            }

            // Reversed so neighbours come off the stack in link order,
            // the order a recursive walk would take them.
            let visited = &self.visited;
            let next = graph
                .neighbours(&node.id)
                .iter()
                .rev()
                .filter(|link| !link.is_tunnel())
                .filter_map(|link| graph.resolve(link))
                .filter(|neighbour| !visited.contains(&neighbour.id));
            self.stack.extend(next);

            return Some(node);
        }
        None
    }
}

/// Own clients of `id` plus those of every node behind it on the local mesh.
///
/// Unknown nodes aggregate to zero; unknown client counts contribute zero
/// but the nodes behind them are still counted.
pub fn aggregate_clients(graph: &MeshGraph, id: &NodeId) -> u64 {
    MeshWalk::new(graph, id)
        .map(|node| node.statistics.client_count())
        .fold(0u64, u64::saturating_add)
}
