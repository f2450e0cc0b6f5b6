//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::registry::RoomRegistry;

use super::{
    handler::{get_room_detail, get_rooms, health_check, lobby_handler, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router over the shared state.
///
/// Exposed so tests can serve the router themselves while keeping a handle
/// on the state, e.g. to close every room on a live server.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lobby/{gid}", get(lobby_handler))
        .route("/ws/{gid}", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{gid}", get(get_room_detail))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Run the lobby server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 1111)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = format!("{}:{}", host, port);
    let app_state = Arc::new(AppState {
        registry: RoomRegistry::new(),
        bind_addr: bind_addr.clone(),
    });

    let app = router(app_state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("lobby server listening on {}", listener.local_addr()?);
    tracing::info!("Connect to: ws://{}/ws/{{gid}}?name=...", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cancel every room and close member connections before exiting.
    app_state.registry.close_all().await;

    tracing::info!("Server shutdown complete");

    Ok(())
}
