//! Per-node detail view served to the dashboard's node infobox.

use std::cmp::Ordering;

use meshview_graph::{Autoupdater, GatewayPath, Hop, Link, Location, MeshGraph, Node, NodeStatus, PathEnd};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::snapshot::MeshState;

/// Everything the infobox shows about one node.
#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: String,
    pub hostname: String,
    pub status: NodeStatus,
    /// Seconds since the node was last seen, relative to the snapshot
    pub last_seen_ago: Option<i64>,
    /// Seconds since the node was first seen, relative to the snapshot
    pub first_seen_ago: Option<i64>,
    pub gateway: bool,
    pub location: Option<Location>,
    pub contact: Option<String>,
    pub model: Option<String>,
    pub mac: Option<String>,
    pub firmware: Option<String>,
    pub site: Option<String>,
    pub uptime: Option<f64>,
    pub addresses: Vec<AddressView>,
    pub load: Option<UsageBar>,
    pub ram: Option<UsageBar>,
    pub autoupdater: Option<Autoupdater>,
    /// Only reported for online nodes
    pub clients: Option<ClientsView>,
    pub selected_gateway: PathView,
    pub neighbours: Vec<NeighbourRow>,
}

/// An IP address; link-local addresses are not linkable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressView {
    pub address: String,
    pub linkable: bool,
}

/// A labelled fill bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageBar {
    pub value: String,
    /// Bar fill (0..1)
    pub fill: f64,
    pub warning: bool,
}

/// Own and aggregated mesh clients of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientsView {
    pub own: Option<u64>,
    pub mesh: u64,
    /// Clients of other nodes behind this one
    pub mesh_only: u64,
}

/// One hop of a gateway path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HopView {
    Node { id: String, hostname: String },
    Unknown { id: String },
    Truncated,
}

impl From<&Hop<'_>> for HopView {
    fn from(hop: &Hop<'_>) -> Self {
        match hop {
            Hop::Node(node) => HopView::Node {
                id: node.id.to_string(),
                hostname: node.display_name().to_string(),
            },
            Hop::Unknown(id) => HopView::Unknown { id: id.to_string() },
            Hop::Truncated => HopView::Truncated,
        }
    }
}

/// A resolved gateway path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathView {
    pub hops: Vec<HopView>,
    /// Hops joined with " -> "
    pub text: String,
    pub end: PathEnd,
}

impl From<&GatewayPath<'_>> for PathView {
    fn from(path: &GatewayPath<'_>) -> Self {
        Self {
            hops: path.hops().iter().map(HopView::from).collect(),
            text: path.to_string(),
            end: path.end(),
        }
    }
}

/// One row of the neighbour table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighbourRow {
    pub id: String,
    pub hostname: String,
    /// False if the neighbour is not part of the snapshot
    pub known: bool,
    pub clients: Option<u64>,
    pub tq: Option<f64>,
    pub distance: Option<f64>,
    pub link_id: String,
    pub link_type: String,
    pub incoming: bool,
    pub tunnel: bool,
    pub has_location: bool,
}

impl NeighbourRow {
    fn new(graph: &MeshGraph, link: &Link) -> Self {
        let neighbour = graph.resolve(link);
        Self {
            id: link.neighbour.to_string(),
            hostname: neighbour.map_or_else(|| link.neighbour.to_string(), |n| n.display_name().to_string()),
            known: neighbour.is_some(),
            clients: neighbour.and_then(|n| n.statistics.clients),
            tq: link.tq,
            distance: link.distance,
            link_id: link.id.clone(),
            link_type: link.link_type.clone(),
            incoming: link.incoming,
            tunnel: link.is_tunnel(),
            has_location: neighbour.is_some_and(Node::has_location),
        }
    }
}

/// Columns the neighbour table sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighbourSort {
    #[default]
    Name,
    Clients,
    Tq,
    Distance,
}

impl NeighbourSort {
    /// Numeric columns list the largest values first.
    pub fn descending_by_default(&self) -> bool {
        !matches!(self, NeighbourSort::Name)
    }

    fn compare(&self, a: &NeighbourRow, b: &NeighbourRow) -> Ordering {
        match self {
            NeighbourSort::Name => compare_names(&a.hostname, &b.hostname),
            NeighbourSort::Clients => missing_last(a.clients.map(|c| c as f64), b.clients.map(|c| c as f64)),
            NeighbourSort::Tq => missing_last(a.tq, b.tq),
            NeighbourSort::Distance => missing_last(a.distance, b.distance),
        }
    }
}

/// Ordering requested for a node's neighbour table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct NeighbourQuery {
    #[serde(default)]
    pub sort: NeighbourSort,
    /// Flip the column's default direction
    #[serde(default)]
    pub reverse: bool,
}

/// Sort neighbour rows by a column in its default direction, flipped if
/// `reverse` is set.
pub fn sort_neighbours(rows: &mut [NeighbourRow], key: NeighbourSort, reverse: bool) {
    let descending = key.descending_by_default() != reverse;
    rows.sort_by(|a, b| {
        let ord = key.compare(a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

/// Case-insensitive name order, exact order as tie-break.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Missing values sort as -1.
pub(crate) fn missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    a.unwrap_or(-1.0).total_cmp(&b.unwrap_or(-1.0))
}

impl NodeView {
    /// Build the view of `node` against the snapshot it belongs to.
    /// Neighbour rows are ordered as `order` asks.
    pub fn new(state: &MeshState, node: &Node, config: &ServerConfig, order: &NeighbourQuery) -> Self {
        let graph = &state.graph;
        let info = &node.info;
        let stats = &node.statistics;

        let mut addresses: Vec<_> = info
            .addresses
            .iter()
            .map(|address| AddressView {
                address: address.clone(),
                linkable: !address.starts_with("fe80:"),
            })
            .collect();
        addresses.sort_by(|a, b| a.address.cmp(&b.address));

        let firmware = [info.firmware_release.as_deref(), info.firmware_base.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");

        let clients = node.is_online().then(|| {
            let mesh = graph.aggregate_clients(&node.id);
            ClientsView {
                own: stats.clients,
                mesh,
                mesh_only: mesh.saturating_sub(stats.client_count()),
            }
        });

        let mut neighbours: Vec<_> = graph
            .neighbours(&node.id)
            .iter()
            .map(|link| NeighbourRow::new(graph, link))
            .collect();
        sort_neighbours(&mut neighbours, order.sort, order.reverse);

        Self {
            id: node.id.to_string(),
            hostname: node.display_name().to_string(),
            status: node.status(),
            last_seen_ago: node.last_seen.map(|t| state.seconds_since(t)),
            first_seen_ago: node.first_seen.map(|t| state.seconds_since(t)),
            gateway: node.flags.gateway,
            location: info.location,
            contact: if config.show_contact { info.contact.clone() } else { None },
            model: info.model.clone(),
            mac: info.mac.clone(),
            firmware: (!firmware.is_empty()).then_some(firmware),
            site: info.site_code.as_deref().map(|code| config.site_name(code).to_string()),
            uptime: stats.uptime,
            addresses,
            load: config.hardware_usage.then(|| load_bar(node)).flatten(),
            ram: config.hardware_usage.then(|| ram_bar(node)).flatten(),
            autoupdater: info.autoupdater.clone(),
            clients,
            selected_gateway: PathView::from(&graph.gateway_path(&node.id)),
            neighbours,
        }
    }
}

/// Load average bar; warns once the load reaches the core count.
fn load_bar(node: &Node) -> Option<UsageBar> {
    let load = node.statistics.loadavg?;
    Some(UsageBar {
        value: format!("{:.2}", load),
        fill: load % 1.0,
        warning: node.info.nproc.is_some_and(|nproc| load >= f64::from(nproc)),
    })
}

/// Memory bar; warns at 80 % usage.
fn ram_bar(node: &Node) -> Option<UsageBar> {
    let usage = node.statistics.memory_usage?;
    Some(UsageBar {
        value: format!("{} %", (usage * 100.0).round()),
        fill: usage,
        warning: usage >= 0.8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use meshview_graph::LinkRecord;

    fn state(nodes: Vec<Node>, links: Vec<LinkRecord>) -> MeshState {
        MeshState {
            graph: MeshGraph::from_parts(nodes, links, []).unwrap(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn online(id: &str, clients: u64) -> Node {
        let mut node = Node::new(id);
        node.flags.online = true;
        node.statistics.clients = Some(clients);
        node
    }

    fn view(state: &MeshState, id: &str, config: &ServerConfig) -> NodeView {
        let node = state.graph.node(&id.into()).unwrap();
        NodeView::new(state, node, config, &NeighbourQuery::default())
    }

    #[test]
    fn clients_include_mesh_behind_node() {
        let s = state(
            vec![online("a", 2), online("b", 3), online("c", 5)],
            vec![
                LinkRecord::new("ab", "a", "b"),
                LinkRecord::tunnel("ac", "a", "c"),
            ],
        );
        let v = view(&s, "a", &ServerConfig::default());
        assert_eq!(
            v.clients,
            Some(ClientsView {
                own: Some(2),
                mesh: 5,
                mesh_only: 3
            })
        );
    }

    #[test]
    fn offline_node_has_no_clients() {
        let mut a = online("a", 2);
        a.flags.online = false;
        let s = state(vec![a], vec![]);
        let v = view(&s, "a", &ServerConfig::default());
        assert_eq!(v.status, NodeStatus::Offline);
        assert!(v.clients.is_none());
    }

    #[test]
    fn selected_gateway_rendered() {
        let mut a = online("a", 0);
        a.statistics.gateway = Some("gw".into());
        a.statistics.nexthop = Some("b".into());
        let mut b = online("b", 0);
        b.statistics.gateway = Some("gw".into());
        b.statistics.nexthop = Some("gw".into());
        b.hostname = Some("relay".to_string());
        let mut gw = online("gw", 0);
        gw.flags.gateway = true;

        let s = state(vec![a, b, gw], vec![]);
        let v = view(&s, "a", &ServerConfig::default());
        assert_eq!(v.selected_gateway.text, "relay -> gw");
        assert_eq!(v.selected_gateway.end, PathEnd::Reached);
        assert_eq!(
            v.selected_gateway.hops[0],
            HopView::Node {
                id: "b".to_string(),
                hostname: "relay".to_string()
            }
        );
    }

    #[test]
    fn hop_views_serialize_with_kind() {
        let json = serde_json::to_value(HopView::Unknown { id: "x".to_string() }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unknown", "id": "x"}));
        let json = serde_json::to_value(HopView::Truncated).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "truncated"}));
    }

    #[test]
    fn static_info_formatting() {
        let mut a = online("a", 0);
        a.info.firmware_release = Some("v2024.1".to_string());
        a.info.site_code = Some("ffhh".to_string());
        a.info.contact = Some("noc@example.org".to_string());
        a.info.addresses = vec!["fe80::1".to_string(), "2001:db8::1".to_string()];
        a.last_seen = Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap());

        let s = state(vec![a], vec![]);
        let mut config = ServerConfig::default();
        config.site_names.insert("ffhh".to_string(), "Hamburg".to_string());

        let v = view(&s, "a", &config);
        assert_eq!(v.firmware.as_deref(), Some("v2024.1"));
        assert_eq!(v.site.as_deref(), Some("Hamburg"));
        assert!(v.contact.is_none());
        assert_eq!(v.last_seen_ago, Some(3600));
        assert_eq!(v.addresses[0].address, "2001:db8::1");
        assert!(v.addresses[0].linkable);
        assert!(!v.addresses[1].linkable);

        config.show_contact = true;
        assert_eq!(view(&s, "a", &config).contact.as_deref(), Some("noc@example.org"));
    }

    #[test]
    fn firmware_joins_release_and_base() {
        let mut a = online("a", 0);
        a.info.firmware_release = Some("v2024.1".to_string());
        a.info.firmware_base = Some("gluon-v2023.2".to_string());
        let s = state(vec![a], vec![]);
        let v = view(&s, "a", &ServerConfig::default());
        assert_eq!(v.firmware.as_deref(), Some("v2024.1 / gluon-v2023.2"));
    }

    #[test]
    fn hardware_bars_only_when_enabled() {
        let mut a = online("a", 0);
        a.statistics.loadavg = Some(2.25);
        a.statistics.memory_usage = Some(0.85);
        a.info.nproc = Some(2);
        let s = state(vec![a], vec![]);

        let v = view(&s, "a", &ServerConfig::default());
        assert!(v.load.is_none());
        assert!(v.ram.is_none());

        let config = ServerConfig {
            hardware_usage: true,
            ..ServerConfig::default()
        };
        let v = view(&s, "a", &config);
        let load = v.load.unwrap();
        assert_eq!(load.value, "2.25");
        assert_eq!(load.fill, 0.25);
        assert!(load.warning);
        let ram = v.ram.unwrap();
        assert_eq!(ram.value, "85 %");
        assert!(ram.warning);
    }

    #[test]
    fn neighbours_listed_and_sorted() {
        let mut b = online("b", 4);
        b.hostname = Some("Bravo".to_string());
        let mut c = online("c", 1);
        c.hostname = Some("alpha".to_string());

        let mut ab = LinkRecord::new("ab", "a", "b");
        ab.source_tq = Some(0.5);
        let mut ca = LinkRecord::new("ca", "c", "a");
        ca.target_tq = Some(0.9);
        ca.distance = Some(120.0);

        let s = state(
            vec![online("a", 0), b, c],
            vec![ab, ca, LinkRecord::new("ax", "a", "x")],
        );
        let mut rows = view(&s, "a", &ServerConfig::default()).neighbours;
        let names: Vec<_> = rows.iter().map(|r| r.hostname.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Bravo", "x"]);
        assert!(rows[0].incoming);
        assert!(!rows[2].known);

        sort_neighbours(&mut rows, NeighbourSort::Tq, false);
        let tq: Vec<_> = rows.iter().map(|r| r.tq).collect();
        assert_eq!(tq, vec![Some(0.9), Some(0.5), None]);

        sort_neighbours(&mut rows, NeighbourSort::Clients, true);
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "c", "b"]);
    }

    #[test]
    fn relative_ages_use_snapshot_time() {
        let mut a = online("a", 0);
        a.first_seen = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() - Duration::days(2));
        let s = state(vec![a], vec![]);
        let v = view(&s, "a", &ServerConfig::default());
        assert_eq!(v.first_seen_ago, Some(2 * 24 * 3600));
        assert_eq!(v.last_seen_ago, None);
    }
}
