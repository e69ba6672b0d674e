//! Axum web server exposing the mesh snapshot as JSON.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use meshview_graph::NodeId;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::error;
use crate::nodelist::{node_list, NodeListQuery, NodeRow};
use crate::snapshot::MeshState;
use crate::view::{NeighbourQuery, NodeView, PathView};

/// Shared application state.
///
/// The snapshot is swapped wholesale on reload; requests clone the `Arc`
/// and keep reading the snapshot they started with.
pub struct AppState {
    config: ServerConfig,
    mesh: RwLock<Arc<MeshState>>,
}

impl AppState {
    async fn snapshot(&self) -> Arc<MeshState> {
        self.mesh.read().await.clone()
    }
}

/// Dashboard backend server.
pub struct MeshServer {
    state: Arc<AppState>,
}

impl MeshServer {
    /// Create a server around an already built snapshot.
    pub fn new(config: ServerConfig, mesh: MeshState) -> Self {
        Self {
            state: Arc::new(AppState {
                config,
                mesh: RwLock::new(Arc::new(mesh)),
            }),
        }
    }

    /// Load the configured snapshot file and create a server around it.
    pub async fn load(config: ServerConfig) -> error::Result<Self> {
        let mesh = MeshState::load(&config.data_path).await?;
        Ok(Self::new(config, mesh))
    }

    /// Build the router for the server.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/status", get(status_handler))
            .route("/api/nodes", get(list_nodes))
            .route("/api/nodes/{id}", get(get_node))
            .route("/api/nodes/{id}/clients", get(get_clients))
            .route("/api/nodes/{id}/gateway-path", get(get_gateway_path))
            .route("/api/reload", post(reload_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let addr = self.state.config.listen_addr;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Mesh dashboard backend running on http://{}", addr);
        axum::serve(listener, self.router()).await
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Server status response.
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    node_count: usize,
    link_count: usize,
    gateway_count: usize,
    online_count: usize,
    timestamp: DateTime<Utc>,
}

impl From<&MeshState> for StatusResponse {
    fn from(mesh: &MeshState) -> Self {
        Self {
            status: "ok",
            node_count: mesh.graph.len(),
            link_count: mesh.graph.link_count(),
            gateway_count: mesh.graph.gateways().count(),
            online_count: mesh.online_count(),
            timestamp: mesh.timestamp,
        }
    }
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let mesh = state.snapshot().await;
    Json(StatusResponse::from(&*mesh))
}

async fn list_nodes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NodeListQuery>,
) -> Json<Vec<NodeRow>> {
    let mesh = state.snapshot().await;
    Json(node_list(&mesh, &query))
}

async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(order): Query<NeighbourQuery>,
) -> Result<Json<NodeView>, StatusCode> {
    let mesh = state.snapshot().await;
    let node = mesh.graph.node(&NodeId::from(id)).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(NodeView::new(&mesh, node, &state.config, &order)))
}

#[derive(Debug, Serialize)]
struct ClientsResponse {
    own: Option<u64>,
    mesh: u64,
}

async fn get_clients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientsResponse>, StatusCode> {
    let mesh = state.snapshot().await;
    let node = mesh.graph.node(&NodeId::from(id)).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ClientsResponse {
        own: node.statistics.clients,
        mesh: mesh.graph.aggregate_clients(&node.id),
    }))
}

async fn get_gateway_path(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PathView>, StatusCode> {
    let mesh = state.snapshot().await;
    let id = NodeId::from(id);
    if mesh.graph.node(&id).is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(PathView::from(&mesh.graph.gateway_path(&id))))
}

async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let fresh = match MeshState::load(&state.config.data_path).await {
        Ok(mesh) => Arc::new(mesh),
        Err(e) => {
            tracing::warn!(error = %e, "reload failed, keeping previous snapshot");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    *state.mesh.write().await = fresh.clone();
    Ok(Json(StatusResponse::from(&*fresh)))
}
