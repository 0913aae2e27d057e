#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use roshambo::{
    config::ServerConfig,
    event::{EventBus, RoomSubscriptions},
    room::{InMemoryRoomRepository, RoomService},
    shared::AppState,
    user::InMemoryPlayerDirectory,
    websockets::{WebSocketRoomSubscriber, WebsocketReceiveHandler},
};

use super::mocks::MockConnectionManager;

pub const ROOM_ID: &str = "ROOM01";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub app_state: AppState,
    pub event_bus: EventBus,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    pub room_service: Arc<RoomService>,
    pub subscriptions: RoomSubscriptions,
    pub players: Vec<String>,
}

pub struct TestSetupBuilder {
    players: Vec<String>,
    results_display: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            // Long enough that no test sees an automatic advance by accident
            results_display: Duration::from_secs(60),
        }
    }

    pub fn with_players(mut self, players: Vec<&str>) -> Self {
        self.players = players.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_players(self) -> Self {
        self.with_players(vec!["alice", "bob"])
    }

    pub fn with_results_display(mut self, results_display: Duration) -> Self {
        self.results_display = results_display;
        self
    }

    /// Seats the configured players, then discards the join traffic
    pub async fn build(self) -> TestSetup {
        let config = ServerConfig {
            results_display: self.results_display,
            ..ServerConfig::default()
        };
        let event_bus = EventBus::new();
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let room_service = Arc::new(RoomService::new(
            Arc::new(InMemoryRoomRepository::new(config.room_ttl)),
            Arc::new(InMemoryPlayerDirectory::new()),
            event_bus.clone(),
            &config,
        ));

        let input_handler =
            WebsocketReceiveHandler::new(room_service.clone(), mock_conn_manager.clone());

        let app_state = AppState::new(
            room_service.clone(),
            mock_conn_manager.clone(),
            event_bus.clone(),
            Arc::new(config),
        );
        let subscriptions = app_state.subscriptions.clone();
        subscriptions
            .ensure(
                ROOM_ID,
                Arc::new(WebSocketRoomSubscriber::new(mock_conn_manager.clone())),
                &event_bus,
            )
            .await;

        let setup = TestSetup {
            app_state,
            event_bus,
            mock_conn_manager,
            input_handler,
            room_service,
            subscriptions,
            players: self.players,
        };

        for player in setup.players.clone() {
            setup.join(&player).await;
        }
        sleep(Duration::from_millis(10)).await;
        setup.clear_messages().await;

        setup
    }
}
