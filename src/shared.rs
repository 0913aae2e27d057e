use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::event::{EventBus, RoomSubscriptions};
use crate::room::RoomService;
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub event_bus: EventBus,
    pub subscriptions: RoomSubscriptions,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        room_service: Arc<RoomService>,
        connection_manager: Arc<dyn ConnectionManager>,
        event_bus: EventBus,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            room_service,
            connection_manager,
            event_bus,
            subscriptions: RoomSubscriptions::new(),
            config,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable kebab-case identifier sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnknownRoom(_) => "unknown-room",
            AppError::MalformedRequest(_) => "malformed-request",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal => "internal",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Unavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::UnknownRoom(_) => StatusCode::NOT_FOUND,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
