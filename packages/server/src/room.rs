//! Game room: per-room connection registry, join/leave lifecycle, and the
//! state-merge-and-broadcast protocol.
//!
//! A [`Room`] owns two maps guarded by a single lock: the merged game state
//! (player name -> opaque payload) and the live connections (player name ->
//! [`PlayerConn`]). The key sets of the two maps are identical at all times;
//! a name is registered in both atomically and removed from both atomically.
//!
//! Broadcasts only enqueue into each player's unbounded channel, so no
//! network I/O ever happens under the room lock. A dedicated send task per
//! connection drains the channel into the WebSocket sink.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde_json::value::RawValue;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use banmen_shared::time::get_unix_timestamp;

use crate::message::{GameMessage, MessageType};

/// Errors returned by [`Room::join`].
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("must provide a player name")]
    EmptyName,
    #[error("player name '{0}' taken")]
    NameTaken(String),
}

/// Handle for one connected player: the display name plus the write side of
/// the connection.
#[derive(Debug, Clone)]
pub struct PlayerConn {
    name: String,
    sender: mpsc::UnboundedSender<String>,
}

impl PlayerConn {
    pub fn new(name: impl Into<String>, sender: mpsc::UnboundedSender<String>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Player display name, assigned at join time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message for delivery to this player. Fails only when the
    /// receiving send task is gone, i.e. the connection is being torn down.
    pub fn send(&self, msg: String) -> Result<(), mpsc::error::SendError<String>> {
        self.sender.send(msg)
    }
}

/// Maps guarded by the room lock. `players` and `connections` always hold the
/// same key set.
struct RoomState {
    players: HashMap<String, Box<RawValue>>,
    connections: HashMap<String, PlayerConn>,
}

/// An isolated group of connected players identified by a shared game id.
///
/// Rooms share no state with each other; every mutation and every snapshot
/// read is serialized through the per-room lock, so joins, state updates and
/// leaves are observed by all players as atomic events in a single order.
pub struct Room {
    id: String,
    created_at: i64,
    state: Mutex<RoomState>,
    cancel: CancellationToken,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: get_unix_timestamp(),
            state: Mutex::new(RoomState {
                players: HashMap::new(),
                connections: HashMap::new(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    /// Game id, equal to the external room name.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Creation time, Unix milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Names of the currently connected players, sorted for consistent
    /// ordering.
    pub async fn player_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.connections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Register a player in the room.
    ///
    /// On success the name is added to both maps atomically, with an empty
    /// `{}` state payload, and the updated full-state snapshot is broadcast
    /// to every connected player, the joiner included, before this returns.
    ///
    /// # Errors
    ///
    /// * [`JoinError::EmptyName`] - the display name is empty
    /// * [`JoinError::NameTaken`] - the name is already registered; the
    ///   existing connection is untouched
    pub async fn join(&self, conn: PlayerConn) -> Result<(), JoinError> {
        if conn.name.is_empty() {
            return Err(JoinError::EmptyName);
        }

        let mut state = self.state.lock().await;
        if state.connections.contains_key(&conn.name) {
            return Err(JoinError::NameTaken(conn.name.clone()));
        }

        let name = conn.name.clone();
        state.players.insert(name.clone(), empty_state());
        state.connections.insert(name.clone(), conn);

        let snapshot = snapshot_message(&state.players);
        broadcast(&state.connections, &snapshot);
        tracing::info!(room = %self.id, player = %name, "player joined");

        Ok(())
    }

    /// Remove a player from the room.
    ///
    /// Idempotent: returns whether the name was actually present. When a
    /// player was removed and peers remain, the updated snapshot is
    /// rebroadcast right away so the departure is visible without waiting
    /// for the next event.
    pub async fn leave(&self, name: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.connections.remove(name).is_some();
        state.players.remove(name);

        if removed {
            if !state.connections.is_empty() {
                let snapshot = snapshot_message(&state.players);
                broadcast(&state.connections, &snapshot);
            }
            tracing::info!(room = %self.id, player = %name, "player left");
        }

        removed
    }

    /// Dispatch one inbound frame from `name`.
    ///
    /// A frame that does not decode is logged and discarded: malformed input
    /// from one player must not affect the others, so there is no disconnect
    /// and no broadcast. The same goes for envelopes of an unrecognized kind.
    pub async fn handle_message(&self, name: &str, text: &str) {
        let msg = match GameMessage::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!(
                    room = %self.id,
                    player = %name,
                    "msg from client not able to decode: {}: {}",
                    e,
                    text
                );
                return;
            }
        };

        match msg.kind() {
            MessageType::PlayerState => {
                let Some(content) = msg.content else {
                    tracing::warn!(room = %self.id, player = %name, "playerstate without content");
                    return;
                };
                let mut state = self.state.lock().await;
                // A frame can race with removal; never resurrect a player.
                if !state.players.contains_key(name) {
                    return;
                }
                state.players.insert(name.to_owned(), content);
                let snapshot = snapshot_message(&state.players);
                broadcast(&state.connections, &snapshot);
                tracing::debug!(room = %self.id, player = %name, "player state received");
            }
            MessageType::Ping => {
                let state = self.state.lock().await;
                if let Some(conn) = state.connections.get(name) {
                    match GameMessage::new(MessageType::Pong, None).encode() {
                        Ok(pong) => {
                            let _ = conn.send(pong);
                        }
                        Err(e) => tracing::error!("failed to encode pong: {}", e),
                    }
                }
            }
            _ => {
                tracing::error!(room = %self.id, "msg type '{}' is undefined", msg.msgtype);
            }
        }
    }

    /// Serialize the current full-state snapshot, wrapped in a `gamestate`
    /// envelope.
    pub async fn get_snapshot(&self) -> String {
        let state = self.state.lock().await;
        snapshot_message(&state.players)
    }

    /// Drive one player's connection for its entire lifetime.
    ///
    /// Splits the socket into a send task (drains the player's queue into the
    /// sink) and a read loop (dispatches inbound frames). The read loop
    /// checks the room's cancellation token on every iteration, so closing
    /// the room promptly stops it even when the peer is silent. Whichever
    /// task finishes first aborts the other, then the player leaves the room.
    pub async fn serve_connection(
        self: Arc<Self>,
        socket: WebSocket,
        name: String,
        mut rx: mpsc::UnboundedReceiver<String>,
    ) {
        let (mut sink, mut stream) = socket.split();

        let mut send_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let room = self.clone();
        let player = name.clone();
        let mut recv_task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = room.cancel.cancelled() => break,
                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            room.handle_message(&player, text.as_str()).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        // Binary frames and protocol-level ping/pong are
                        // not part of the lobby protocol.
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!(
                                room = %room.id,
                                player = %player,
                                "read failed: player exited: {}",
                                e
                            );
                            break;
                        }
                    },
                }
            }
        });

        tokio::select! {
            _ = &mut recv_task => send_task.abort(),
            _ = &mut send_task => recv_task.abort(),
        };

        self.leave(&name).await;
    }

    /// Close the room: cancel every read loop scoped to it and drop every
    /// member connection. Dropping a [`PlayerConn`] sender ends its send
    /// task, which closes the underlying socket.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut state = self.state.lock().await;
        state.connections.clear();
        state.players.clear();
    }
}

fn empty_state() -> Box<RawValue> {
    RawValue::from_string("{}".to_string()).expect("literal is valid JSON")
}

/// Serialize the players map wrapped in a `gamestate` envelope. Serialization
/// of opaque-but-valid JSON payloads cannot realistically fail; if it ever
/// does, an empty snapshot is produced and the error logged.
fn snapshot_message(players: &HashMap<String, Box<RawValue>>) -> String {
    let content = serde_json::to_string(players)
        .ok()
        .and_then(|s| RawValue::from_string(s).ok());
    if content.is_none() {
        tracing::error!("failed to marshal game state");
    }
    GameMessage::new(MessageType::GameState, content)
        .encode()
        .unwrap_or_else(|e| {
            tracing::error!("failed to marshal game state: {}", e);
            String::new()
        })
}

/// Deliver the same bytes to every registered connection. Best effort per
/// recipient: a failed write is logged and neither aborts delivery to the
/// others nor removes the connection (removal is the read loop's job).
fn broadcast(connections: &HashMap<String, PlayerConn>, msg: &str) {
    for conn in connections.values() {
        if conn.send(msg.to_owned()).is_err() {
            tracing::warn!(player = %conn.name, "write failed");
        }
    }
}
