//! Meshview dashboard backend
//!
//! Usage: `meshview [SNAPSHOT] [PORT]`. Arguments override `MESHVIEW_DATA`
//! and the port of `MESHVIEW_ADDR`.

use std::env;
use std::path::PathBuf;

use meshview_server::{MeshServer, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshview=info,meshview_server=info,meshview_graph=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env()?;

    // Parse command line args
    let args: Vec<String> = env::args().collect();
    if let Some(path) = args.get(1) {
        config.data_path = PathBuf::from(path);
    }
    if let Some(port) = args.get(2) {
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port: {}", port))?;
        config.listen_addr.set_port(port);
    }

    tracing::info!(snapshot = %config.data_path.display(), "Starting meshview");

    let server = MeshServer::load(config).await?;
    server.serve().await?;

    Ok(())
}
