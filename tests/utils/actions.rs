#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use roshambo::websockets::{
    connect_player, disconnect_player, MessageHandler, MessageType, WebSocketMessage,
};

use super::setup::{TestSetup, ROOM_ID};

// ============================================================================
// Action Helpers
// ============================================================================

/// Display name derived from the player id, e.g. "alice" -> "Alice"
fn display_name(player_id: &str) -> String {
    let mut chars = player_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TestSetup {
    /// Send a WebSocket message and wait for processing
    pub async fn send_message(&self, player_id: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.input_handler
            .handle_message(player_id, ROOM_ID, message_json)
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Clear all recorded messages
    pub async fn clear_messages(&self) {
        self.mock_conn_manager.clear_messages().await;
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Join the room the way a socket connection does
    pub async fn join(&self, player_id: &str) {
        self.connect(player_id).await;
    }

    /// Open a socket for the player; the receiver sees everything the socket would
    pub async fn connect(&self, player_id: &str) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection_id = connect_player(
            &self.app_state,
            ROOM_ID,
            player_id,
            &display_name(player_id),
            sender,
        )
        .await;
        sleep(Duration::from_millis(10)).await;
        (connection_id, receiver)
    }

    /// Close a socket opened with `connect`
    pub async fn disconnect(&self, player_id: &str, connection_id: Uuid) {
        disconnect_player(&self.app_state, ROOM_ID, player_id, connection_id).await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Join over HTTP, with no socket involved
    pub async fn join_over_http(&self, player_id: &str) {
        self.room_service
            .join(ROOM_ID, player_id, &display_name(player_id))
            .await
            .unwrap();
        sleep(Duration::from_millis(10)).await;
    }

    pub async fn send_choice(&self, player_id: &str, choice: &str) {
        self.send_message(player_id, WebSocketMessage::make_choice(choice))
            .await;
    }

    pub async fn send_next_round(&self, player_id: &str) {
        self.send_message(player_id, WebSocketMessage::next_round_request())
            .await;
    }

    pub async fn send_leave(&self, player_id: &str) {
        self.send_message(player_id, WebSocketMessage::leave()).await;
    }

    /// Play one full round and discard the resulting traffic
    pub async fn play_round(&self, first: (&str, &str), second: (&str, &str)) {
        self.send_choice(first.0, first.1).await;
        self.send_choice(second.0, second.1).await;
        self.clear_messages().await;
    }
}

/// Message types waiting on a socket receiver, oldest first
pub fn drain_types(receiver: &mut mpsc::UnboundedReceiver<String>) -> Vec<MessageType> {
    let mut types = Vec::new();
    while let Ok(raw) = receiver.try_recv() {
        let message: WebSocketMessage = serde_json::from_str(&raw).unwrap();
        types.push(message.message_type);
    }
    types
}
