//! Real-time multiplayer lobby/room server.
//!
//! Clients connect over WebSocket, join a named room, submit per-player state
//! updates, and receive a merged snapshot of every player's state in that
//! room whenever anything changes. Player state is an opaque, mergeable blob:
//! the server passes it through without inspecting it, which keeps the room
//! decoupled from any particular game's rules.

pub mod message;
pub mod registry;
pub mod room;
pub mod server;
