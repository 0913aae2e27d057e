use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Tracks which room each player is seated in, so a player can leave by id
/// alone and joining a new room can vacate the old one
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Records the player's room, returning the room they were in before
    async fn assign(&self, player_id: &str, room_id: &str) -> Option<String>;

    /// Room the player is currently seated in
    async fn room_of(&self, player_id: &str) -> Option<String>;

    /// Forgets the player, but only if they are still recorded in `room_id`
    async fn release(&self, player_id: &str, room_id: &str) -> bool;
}

/// In-memory implementation of PlayerDirectory
/// Uses RwLock for concurrent access with read optimization
pub struct InMemoryPlayerDirectory {
    player_rooms: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryPlayerDirectory {
    pub fn new() -> Self {
        Self {
            player_rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryPlayerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryPlayerDirectory {
    async fn assign(&self, player_id: &str, room_id: &str) -> Option<String> {
        let previous = self
            .player_rooms
            .write()
            .await
            .insert(player_id.to_string(), room_id.to_string());

        debug!(
            player_id = %player_id,
            room_id = %room_id,
            previous = ?previous,
            "Player assigned to room"
        );
        previous.filter(|p| p != room_id)
    }

    async fn room_of(&self, player_id: &str) -> Option<String> {
        self.player_rooms.read().await.get(player_id).cloned()
    }

    async fn release(&self, player_id: &str, room_id: &str) -> bool {
        let mut player_rooms = self.player_rooms.write().await;
        if player_rooms.get(player_id).is_some_and(|r| r == room_id) {
            player_rooms.remove(player_id);
            debug!(player_id = %player_id, room_id = %room_id, "Player released from room");
            true
        } else {
            false
        }
    }
}
