use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Outbound routes to connected players, keyed by player id.
///
/// A player has at most one live route. Reconnecting replaces it, and each
/// route carries the id of the socket that registered it so a replaced
/// socket cannot tear down its successor.
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    /// Registers the socket's sender and returns its connection id
    async fn add_connection(&self, player_id: String, sender: mpsc::UnboundedSender<String>)
        -> Uuid;

    /// Removes the route only if it still belongs to `connection_id`;
    /// returns whether it did
    async fn remove_connection(&self, player_id: &str, connection_id: Uuid) -> bool;

    async fn send_to_player(&self, player_id: &str, message: &str);

    async fn send_to_players(&self, player_ids: &[String], message: &str);
}

struct Route {
    connection_id: Uuid,
    sender: mpsc::UnboundedSender<String>,
}

#[derive(Default)]
pub struct InMemoryConnectionManager {
    // player id -> current route
    connections: Arc<RwLock<HashMap<String, Route>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(
        &self,
        player_id: String,
        sender: mpsc::UnboundedSender<String>,
    ) -> Uuid {
        let connection_id = Uuid::new_v4();
        let mut connections = self.connections.write().await;
        connections.insert(
            player_id,
            Route {
                connection_id,
                sender,
            },
        );
        connection_id
    }

    async fn remove_connection(&self, player_id: &str, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(player_id) {
            Some(route) if route.connection_id == connection_id => {
                connections.remove(player_id);
                true
            }
            _ => false,
        }
    }

    async fn send_to_player(&self, player_id: &str, message: &str) {
        let connections = self.connections.read().await;
        if let Some(route) = connections.get(player_id) {
            let _ = route.sender.send(message.to_string());
        }
    }

    async fn send_to_players(&self, player_ids: &[String], message: &str) {
        let connections = self.connections.read().await;
        for player_id in player_ids {
            if let Some(route) = connections.get(player_id) {
                let _ = route.sender.send(message.to_string());
            }
        }
    }
}
