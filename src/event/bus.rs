use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::RoomEvent;

/// Buffered events per room before slow subscribers start lagging
const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Event bus for distributing events throughout the application
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Emits an event to all subscribers of a specific room; returns whether
    /// any subscriber received it.
    /// Rooms nobody listens to are skipped without allocating a channel.
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) -> bool {
        let room_channels = self.room_channels.read().await;

        match room_channels.get(room_id) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        room_id = %room_id,
                        receivers = receiver_count,
                        "Room event emitted"
                    );
                    true
                }
                Err(_) => {
                    debug!(room_id = %room_id, "Room event emitted with no receivers");
                    false
                }
            },
            None => {
                debug!(room_id = %room_id, "No subscribers for room, event dropped");
                false
            }
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        let mut room_channels = self.room_channels.write().await;

        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| {
                debug!(room_id = %room_id, "Creating new room channel for subscription");
                broadcast::channel(ROOM_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    /// Sends `RoomClosed` and drops the room's channel in one step, so a
    /// subscriber started afterwards always gets a fresh channel. Existing
    /// subscribers see the stream end after draining what was already sent.
    pub async fn close_room(&self, room_id: &str) {
        if let Some(sender) = self.room_channels.write().await.remove(room_id) {
            let _ = sender.send(RoomEvent::RoomClosed);
            debug!(room_id = %room_id, "Room channel closed");
        }
    }

    pub async fn has_room_channel(&self, room_id: &str) -> bool {
        self.room_channels.read().await.contains_key(room_id)
    }
}
