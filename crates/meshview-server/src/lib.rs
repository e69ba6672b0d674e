//! Meshview Server
//!
//! Backend of the mesh dashboard. Loads a mesh snapshot, builds its graph and
//! serves node lists and per-node details as JSON.
//!
//! # Architecture
//!
//! - **Snapshot**: JSON document from the data collector, built into a graph
//! - **Views**: node infobox (clients, selected gateway, neighbours) and node list
//! - **REST API**: status, node list, node details, reload
//!
//! The snapshot is replaced wholesale on reload; every request reads one
//! consistent snapshot.
//!
//! # Usage
//!
//! ```no_run
//! use meshview_server::{MeshServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     let server = MeshServer::load(config).await?;
//!     server.serve().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod nodelist;
pub mod server;
pub mod snapshot;
pub mod view;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use nodelist::{node_list, NodeListQuery, NodeRow, NodeSort};
pub use server::MeshServer;
pub use snapshot::{MeshState, Snapshot};
pub use view::{HopView, NeighbourQuery, NeighbourRow, NeighbourSort, NodeView, PathView};
