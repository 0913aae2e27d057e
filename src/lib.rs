// Library crate for the roshambo room server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod game;
pub mod room;
pub mod shared;
pub mod sync;
pub mod user;
pub mod websockets;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use event::{EventBus, RoomEvent, RoomSubscription};
pub use game::{resolve, Move, Outcome};
pub use room::{repository::RoomRepository, RoomService, RoomSnapshot};
pub use shared::{AppError, AppState};
pub use sync::{StatusPoller, StatusSource, SyncMode};
pub use websockets::{
    ConnectionManager, MessageHandler, MessageType, WebSocketMessage, WebSocketRoomSubscriber,
    WebsocketReceiveHandler,
};

/// All HTTP and WebSocket routes over the given state
pub fn app(app_state: AppState) -> Router {
    Router::new()
        .route("/api/rooms", post(room::create_room))
        .route("/api/config", get(room::client_config))
        .route("/api/game/join", post(room::join_room))
        .route("/api/game/choice", post(room::submit_choice))
        .route("/api/game/next-round", post(room::next_round))
        .route("/api/game/status", get(room::room_status))
        .route("/api/game/leave", post(room::leave_room))
        .route("/ws/:room_id", get(websockets::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
