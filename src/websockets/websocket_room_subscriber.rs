use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    event::{RoomEvent, RoomEventError, RoomEventHandler},
    websockets::{connection_manager::ConnectionManager, messages::WebSocketMessage},
};

/// Turns room events into WebSocket messages for the seated players.
///
/// Events are delivered in commit order per room, but a snapshot older than
/// one already forwarded is dropped so a client never sees state regress.
pub struct WebSocketRoomSubscriber {
    connection_manager: Arc<dyn ConnectionManager>,
    forwarded: Mutex<HashMap<String, u64>>,
}

impl WebSocketRoomSubscriber {
    pub fn new(connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            connection_manager,
            forwarded: Mutex::new(HashMap::new()),
        }
    }

    /// Records the version as forwarded; false if it is not newer
    async fn claim_version(&self, room_id: &str, version: u64) -> bool {
        let mut forwarded = self.forwarded.lock().await;
        match forwarded.get(room_id) {
            Some(&last) if version <= last => false,
            _ => {
                forwarded.insert(room_id.to_string(), version);
                true
            }
        }
    }

    async fn send(&self, recipients: &[String], message: WebSocketMessage) -> Result<(), RoomEventError> {
        let message_json = serde_json::to_string(&message).map_err(|e| {
            RoomEventError::HandlerError(format!("Failed to serialize message: {}", e))
        })?;
        self.connection_manager
            .send_to_players(recipients, &message_json)
            .await;
        Ok(())
    }
}

#[async_trait]
impl RoomEventHandler for WebSocketRoomSubscriber {
    async fn handle_room_event(
        &self,
        room_id: &str,
        event: RoomEvent,
    ) -> Result<(), RoomEventError> {
        debug!(
            room_id = %room_id,
            event = event.event_type(),
            "Handling room event for WebSocket connections"
        );

        if let Some(room) = event.room() {
            if !self.claim_version(room_id, room.version).await {
                debug!(
                    room_id = %room_id,
                    version = room.version,
                    "Dropping stale room event"
                );
                return Ok(());
            }
        }

        match event {
            RoomEvent::PlayerJoined { started, room, .. } => {
                let everyone = room.player_ids();
                self.send(&everyone, WebSocketMessage::room_update(room.clone()))
                    .await?;
                if started {
                    self.send(&everyone, WebSocketMessage::game_start(room))
                        .await?;
                }
                Ok(())
            }
            RoomEvent::PlayerChose { player_id, room } => {
                let opponents: Vec<String> = room
                    .player_ids()
                    .into_iter()
                    .filter(|id| id != &player_id)
                    .collect();
                self.send(
                    std::slice::from_ref(&player_id),
                    WebSocketMessage::room_update(room.clone()),
                )
                .await?;
                self.send(&opponents, WebSocketMessage::player_chose(player_id, room))
                    .await
            }
            RoomEvent::RoundCompleted { result, room } => {
                let everyone = room.player_ids();
                self.send(&everyone, WebSocketMessage::round_results(result, room))
                    .await
            }
            RoomEvent::RoundAdvanced { room } => {
                let everyone = room.player_ids();
                self.send(&everyone, WebSocketMessage::next_round(room))
                    .await
            }
            RoomEvent::PlayerLeft { player_id, room } => {
                let mut recipients = room.player_ids();
                recipients.push(player_id.clone());
                self.send(&recipients, WebSocketMessage::player_left(player_id, room))
                    .await
            }
            RoomEvent::RoomClosed => {
                self.forwarded.lock().await.remove(room_id);
                Ok(())
            }
        }
    }

    fn handler_name(&self) -> &'static str {
        "WebSocketRoomSubscriber"
    }
}
