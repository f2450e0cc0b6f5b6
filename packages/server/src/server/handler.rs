//! WebSocket and HTTP endpoint handlers.
//!
//! The WebSocket handler is the join handoff: it resolves the room from the
//! path, validates the join before the upgrade, and hands the upgraded socket
//! to [`Room::serve_connection`](crate::room::Room::serve_connection). The
//! HTTP handlers are read-only views over the registry.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tokio::sync::mpsc;

use banmen_shared::time::timestamp_to_rfc3339;

use crate::registry::RegistryError;
use crate::room::{JoinError, PlayerConn};

use super::state::{AppState, ConnectQuery};

/// Connection info returned by the lobby endpoint
#[derive(Debug, Serialize)]
pub struct LobbyInfo {
    pub gid: String,
    pub ws_url: String,
}

/// Room summary for the rooms listing
#[derive(Debug, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub players: Vec<String>,
    pub created_at: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(gid): Path<String>,
    Query(query): Query<ConnectQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    let room = state
        .registry
        .get_or_create(&gid)
        .await
        .map_err(|e| match e {
            RegistryError::EmptyRoomId => StatusCode::BAD_REQUEST,
        })?;

    // Register the player before upgrading so a rejected join surfaces as an
    // HTTP status instead of an immediately-closed socket.
    let (tx, rx) = mpsc::unbounded_channel();
    let name = query.name;
    if let Err(e) = room.join(PlayerConn::new(name.clone(), tx)).await {
        tracing::warn!(gid = %gid, player = %name, "player failed to join: {}", e);
        return Err(match e {
            JoinError::EmptyName => StatusCode::BAD_REQUEST,
            JoinError::NameTaken(_) => StatusCode::CONFLICT,
        });
    }

    tracing::info!(gid = %gid, player = %name, "player connected and registered");

    // The player is registered before the handshake finishes. If the upgrade
    // never completes, serve_connection never runs and nothing else would
    // take the name back out of the room.
    let cleanup_room = room.clone();
    let cleanup_name = name.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!(player = %cleanup_name, "websocket upgrade failed: {}", e);
            tokio::spawn(async move {
                cleanup_room.leave(&cleanup_name).await;
            });
        })
        .on_upgrade(move |socket| room.serve_connection(socket, name, rx)))
}

/// Create the room if absent and return its connection info.
pub async fn lobby_handler(
    Path(gid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<LobbyInfo>, StatusCode> {
    let room = state
        .registry
        .get_or_create(&gid)
        .await
        .map_err(|e| match e {
            RegistryError::EmptyRoomId => StatusCode::BAD_REQUEST,
        })?;

    Ok(Json(LobbyInfo {
        gid: room.id().to_owned(),
        ws_url: format!("ws://{}/ws/{}", state.bind_addr, room.id()),
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    let rooms = state.registry.rooms().await;

    let mut summaries = Vec::with_capacity(rooms.len());
    for room in rooms {
        summaries.push(RoomSummary {
            id: room.id().to_owned(),
            players: room.player_names().await,
            created_at: timestamp_to_rfc3339(room.created_at()),
        });
    }

    Json(summaries)
}

/// Get room detail by game id
pub async fn get_room_detail(
    Path(gid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoomSummary>, StatusCode> {
    match state.registry.get(&gid).await {
        Some(room) => Ok(Json(RoomSummary {
            id: room.id().to_owned(),
            players: room.player_names().await,
            created_at: timestamp_to_rfc3339(room.created_at()),
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}
