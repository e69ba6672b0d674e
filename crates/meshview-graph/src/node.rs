//! Mesh nodes and the telemetry they report.

use std::fmt;

use chrono::{DateTime, Utc};

/// Stable identifier of a mesh node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub String);

impl NodeId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Reachability flags reported for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeFlags {
    /// Node answered during the last collection round
    pub online: bool,
    /// Node provides internet egress
    pub gateway: bool,
    /// Node appeared in a link but never reported itself
    pub unseen: bool,
}

/// Display status derived from [`NodeFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeStatus {
    /// Reporting
    Online,
    /// Known, not reporting
    Offline,
    /// Never reported
    Unseen,
}

impl NodeFlags {
    /// Collapse the flags into one status. `unseen` takes precedence.
    pub fn status(&self) -> NodeStatus {
        if self.unseen {
            NodeStatus::Unseen
        } else if self.online {
            NodeStatus::Online
        } else {
            NodeStatus::Offline
        }
    }
}

/// Live statistics of a node.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Statistics {
    /// Directly attached clients, `None` when unknown or malformed
    #[cfg_attr(feature = "serde", serde(deserialize_with = "lenient::client_count"))]
    pub clients: Option<u64>,
    /// One-minute load average
    pub loadavg: Option<f64>,
    /// Fraction of memory in use (0..1)
    pub memory_usage: Option<f64>,
    /// Seconds since boot
    pub uptime: Option<f64>,
    /// Next hop toward any destination
    pub nexthop: Option<NodeId>,
    /// Selected gateway
    pub gateway: Option<NodeId>,
    /// Next hop toward the selected gateway
    pub gateway_nexthop: Option<NodeId>,
}

impl Statistics {
    /// Client count for aggregation: unknown counts as zero.
    pub fn client_count(&self) -> u64 {
        self.clients.unwrap_or(0)
    }

    /// The next hop used for gateway traffic.
    ///
    /// `gateway_nexthop` wins over `nexthop` when both are reported.
    pub fn preferred_nexthop(&self) -> Option<&NodeId> {
        self.gateway_nexthop.as_ref().or(self.nexthop.as_ref())
    }
}

/// Geographic position of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Firmware autoupdater settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Autoupdater {
    pub enabled: bool,
    pub branch: Option<String>,
}

/// Static information a node announces about itself.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeInfo {
    /// Hardware model
    pub model: Option<String>,
    /// Number of CPU cores
    pub nproc: Option<u32>,
    /// Firmware release
    pub firmware_release: Option<String>,
    /// Firmware base (upstream version)
    pub firmware_base: Option<String>,
    /// Site (community) code
    pub site_code: Option<String>,
    /// IP addresses
    pub addresses: Vec<String>,
    /// Primary MAC address
    pub mac: Option<String>,
    /// Owner contact
    pub contact: Option<String>,
    pub autoupdater: Option<Autoupdater>,
    pub location: Option<Location>,
}

/// One mesh participant.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Stable identifier
    #[cfg_attr(feature = "serde", serde(rename = "node_id"))]
    pub id: NodeId,
    /// Display name
    #[cfg_attr(feature = "serde", serde(default))]
    pub hostname: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: NodeFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub statistics: Statistics,
    #[cfg_attr(feature = "serde", serde(default, rename = "firstseen"))]
    pub first_seen: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default, rename = "lastseen"))]
    pub last_seen: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default, rename = "nodeinfo"))]
    pub info: NodeInfo,
}

impl Node {
    /// Create a node with no telemetry.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Hostname if known, else the identifier.
    pub fn display_name(&self) -> &str {
        self.hostname.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn status(&self) -> NodeStatus {
        self.flags.status()
    }

    pub fn is_online(&self) -> bool {
        self.flags.online
    }

    pub fn has_location(&self) -> bool {
        self.info.location.is_some()
    }
}

#[cfg(feature = "serde")]
mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

    /// Reads a client count; anything other than a non-negative whole
    /// number becomes `None`.
    pub fn client_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ClientCount)
    }

    struct ClientCount;

    impl<'de> Visitor<'de> for ClientCount {
        type Value = Option<u64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a client count")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(u64::try_from(v).ok())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            let whole = v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64;
            Ok(whole.then_some(v as u64))
        }

        fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Ok(None)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
            Ok(None)
        }
    }
}
