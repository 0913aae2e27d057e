#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use roshambo::websockets::ConnectionManager;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Records every outbound message per player, and forwards it to the
/// player's current socket channel when one is registered
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    connected_players: Arc<RwLock<Vec<String>>>,
    routes: Arc<RwLock<HashMap<String, (Uuid, mpsc::UnboundedSender<String>)>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_connected_player(&self, player_id: &str) {
        self.connected_players
            .write()
            .await
            .push(player_id.to_string());
    }

    pub async fn is_connected(&self, player_id: &str) -> bool {
        self.connected_players
            .read()
            .await
            .iter()
            .any(|p| p == player_id)
    }

    pub async fn get_messages_for(&self, player_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(player_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pops the oldest unread message for the player
    pub async fn consume_message_for(&self, player_id: &str) -> Option<String> {
        self.sent_messages
            .write()
            .await
            .get_mut(player_id)
            .and_then(|queue| queue.pop_front())
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(
        &self,
        player_id: String,
        sender: mpsc::UnboundedSender<String>,
    ) -> Uuid {
        let connection_id = Uuid::new_v4();
        if !self.is_connected(&player_id).await {
            self.add_connected_player(&player_id).await;
        }
        self.routes
            .write()
            .await
            .insert(player_id, (connection_id, sender));
        connection_id
    }

    async fn remove_connection(&self, player_id: &str, connection_id: Uuid) -> bool {
        let mut routes = self.routes.write().await;
        if routes.get(player_id).map(|(id, _)| *id) != Some(connection_id) {
            return false;
        }
        routes.remove(player_id);
        self.connected_players
            .write()
            .await
            .retain(|p| p != player_id);
        true
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .push_back(message.to_string());
        if let Some((_, sender)) = self.routes.read().await.get(player_id) {
            let _ = sender.send(message.to_string());
        }
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        for player_id in player_ids {
            self.send_to_player(player_id, message).await;
        }
    }
}
