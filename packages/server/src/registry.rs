//! Room registry: maps a game id to its live [`Room`], creating rooms lazily
//! on first reference.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::room::Room;

/// Errors returned by [`RoomRegistry::get_or_create`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("game id cannot be blank")]
    EmptyRoomId,
}

/// Thread-safe registry of live rooms, keyed by game id.
///
/// Rooms are fully independent of each other; the registry lock is only held
/// for map lookups, never for room operations.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Arc<Room>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Return the room registered under `gid`, creating and registering a new
    /// one if absent. Idempotent: as long as a room is registered, every
    /// reference to its id yields the same instance.
    pub async fn get_or_create(&self, gid: &str) -> Result<Arc<Room>, RegistryError> {
        if gid.is_empty() {
            return Err(RegistryError::EmptyRoomId);
        }

        let mut rooms = self.rooms.lock().await;
        if let Some(room) = rooms.get(gid) {
            return Ok(room.clone());
        }

        let room = Arc::new(Room::new(gid));
        rooms.insert(gid.to_owned(), room.clone());
        tracing::info!(gid = %gid, "new game room created");
        Ok(room)
    }

    /// Look up a room without creating it.
    pub async fn get(&self, gid: &str) -> Option<Arc<Room>> {
        let rooms = self.rooms.lock().await;
        rooms.get(gid).cloned()
    }

    /// All registered rooms, sorted by id.
    pub async fn rooms(&self) -> Vec<Arc<Room>> {
        let rooms = self.rooms.lock().await;
        let mut all: Vec<Arc<Room>> = rooms.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Close every room and empty the registry. Used at process shutdown:
    /// each room cancels its read loops and closes its member connections.
    pub async fn close_all(&self) {
        let drained: Vec<Arc<Room>> = {
            let mut rooms = self.rooms.lock().await;
            rooms.drain().map(|(_, room)| room).collect()
        };
        for room in drained {
            room.close().await;
        }
        tracing::info!("all rooms closed");
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        // テスト項目: 同じ gid への参照は同一の Room インスタンスを返す
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let first = registry.get_or_create("R1").await.unwrap();
        let second = registry.get_or_create("R1").await.unwrap();

        // then (期待する結果):
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.rooms().await.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_game_id_is_rejected() {
        // テスト項目: 空の gid では部屋を作れない
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let result = registry.get_or_create("").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RegistryError::EmptyRoomId)));
        assert!(registry.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_does_not_create() {
        // テスト項目: get は部屋を作らない
        // given (前提条件):
        let registry = RoomRegistry::new();

        // when (操作):
        let missing = registry.get("R1").await;

        // then (期待する結果):
        assert!(missing.is_none());
        assert!(registry.rooms().await.is_empty());
    }

    #[tokio::test]
    async fn test_rooms_are_sorted_by_id() {
        // テスト項目: rooms が id 順で返る
        // given (前提条件):
        let registry = RoomRegistry::new();
        registry.get_or_create("R2").await.unwrap();
        registry.get_or_create("R1").await.unwrap();

        // when (操作):
        let rooms = registry.rooms().await;

        // then (期待する結果):
        let ids: Vec<&str> = rooms.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["R1", "R2"]);
    }

    #[tokio::test]
    async fn test_close_all_empties_registry() {
        // テスト項目: close_all で全部屋が閉じられ、レジストリが空になる
        // given (前提条件):
        let registry = RoomRegistry::new();
        registry.get_or_create("R1").await.unwrap();
        registry.get_or_create("R2").await.unwrap();

        // when (操作):
        registry.close_all().await;

        // then (期待する結果):
        assert!(registry.get("R1").await.is_none());
        assert!(registry.rooms().await.is_empty());
    }
}
