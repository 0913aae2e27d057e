use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::Move;
use crate::room::code::{normalize_player_id, normalize_player_name, normalize_room_id};
use crate::room::RoomService;
use crate::shared::{AppError, AppState};
use crate::websockets::messages::{MessageType, WebSocketMessage};

use super::{
    connection_manager::ConnectionManager,
    socket::{Connection, MessageHandler},
    websocket_room_subscriber::WebSocketRoomSubscriber,
};

/// Routes client frames to the room service. Results reach clients through
/// room events; only failures are answered directly, as ERROR messages.
pub struct WebsocketReceiveHandler {
    room_service: Arc<RoomService>,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl WebsocketReceiveHandler {
    pub fn new(
        room_service: Arc<RoomService>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            room_service,
            connection_manager,
        }
    }

    async fn reply_error(&self, player_id: &str, message: String, code: &str) {
        if let Ok(json) = serde_json::to_string(&WebSocketMessage::error(message, code)) {
            self.connection_manager.send_to_player(player_id, &json).await;
        }
    }

    async fn dispatch(
        &self,
        player_id: &str,
        room_id: &str,
        message: WebSocketMessage,
    ) -> Result<(), AppError> {
        match message.message_type {
            MessageType::MakeChoice => {
                let choice: Move = message
                    .payload
                    .get("choice")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| AppError::MalformedRequest("choice is required".to_string()))?
                    .parse()
                    .map_err(|e: crate::game::ParseMoveError| {
                        AppError::MalformedRequest(e.to_string())
                    })?;

                let receipt = self
                    .room_service
                    .submit_choice(room_id, player_id, choice)
                    .await?;
                if let Some(reason) = receipt.rejected {
                    self.reply_error(player_id, reason.to_string(), reason.code())
                        .await;
                }
                Ok(())
            }
            MessageType::NextRound => {
                self.room_service.advance_round(room_id).await?;
                Ok(())
            }
            MessageType::Leave => {
                self.room_service.leave(player_id, Some(room_id)).await?;
                Ok(())
            }
            other => Err(AppError::MalformedRequest(format!(
                "{:?} is not a client message",
                other
            ))),
        }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, player_id: &str, room_id: &str, message: String) {
        debug!(
            player_id = %player_id,
            room_id = %room_id,
            message = %message,
            "Received message"
        );

        let parsed = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    player_id = %player_id,
                    room_id = %room_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                self.reply_error(player_id, format!("Unreadable message: {}", e), "malformed-request")
                    .await;
                return;
            }
        };

        if let Err(e) = self.dispatch(player_id, room_id, parsed).await {
            warn!(
                player_id = %player_id,
                room_id = %room_id,
                error = %e,
                "WebSocket message rejected"
            );
            self.reply_error(player_id, e.to_string(), e.code()).await;
        }
    }
}

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketQuery {
    pub player_id: Option<String>,
    pub player_name: String,
}

/// GET /ws/{room_id}?playerId=X&playerName=Y
///
/// Connecting joins the room; disconnecting leaves it. A missing player id
/// is replaced by a fresh one, so each anonymous socket is its own player.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WebSocketQuery>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    let room_id = normalize_room_id(&room_id)?;
    let player_name = normalize_player_name(&query.player_name)?;
    let player_id = match query.player_id {
        Some(raw) => normalize_player_id(&raw)?,
        None => Uuid::new_v4().to_string(),
    };

    info!(
        room_id = %room_id,
        player_id = %player_id,
        "WebSocket connection requested"
    );

    Ok(ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, room_id, player_id, player_name, app_state)
    }))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    room_id: String,
    player_id: String,
    player_name: String,
    app_state: AppState,
) {
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();
    let connection_id = connect_player(
        &app_state,
        &room_id,
        &player_id,
        &player_name,
        outbound_sender,
    )
    .await;

    let message_handler = Arc::new(WebsocketReceiveHandler::new(
        Arc::clone(&app_state.room_service),
        Arc::clone(&app_state.connection_manager),
    ));

    let connection = Connection::new(
        player_id.clone(),
        room_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(room_id = %room_id, player_id = %player_id, "WebSocket connection closed cleanly");
        }
        Err(e) => {
            warn!(room_id = %room_id, player_id = %player_id, error = ?e, "WebSocket connection error");
        }
    }

    disconnect_player(&app_state, &room_id, &player_id, connection_id).await;
}

async fn subscribe_room(app_state: &AppState, room_id: &str) {
    app_state
        .subscriptions
        .ensure(
            room_id,
            Arc::new(WebSocketRoomSubscriber::new(Arc::clone(
                &app_state.connection_manager,
            ))),
            &app_state.event_bus,
        )
        .await;
}

/// Routes the socket's outbound channel to the player and seats them.
/// Returns the connection id to hand back to `disconnect_player`.
pub async fn connect_player(
    app_state: &AppState,
    room_id: &str,
    player_id: &str,
    player_name: &str,
    outbound_sender: mpsc::UnboundedSender<String>,
) -> Uuid {
    // The room channel must exist before the join event is emitted
    subscribe_room(app_state, room_id).await;

    let connection_id = app_state
        .connection_manager
        .add_connection(player_id.to_string(), outbound_sender.clone())
        .await;

    let direct = match app_state
        .room_service
        .seat(room_id, player_id, player_name)
        .await
    {
        // The subscriber delivers this snapshot in order with later events
        Ok(receipt) if receipt.announced => None,
        Ok(receipt) => {
            // Nothing was emitted, or the room was closed and reopened under us
            subscribe_room(app_state, room_id).await;
            Some(WebSocketMessage::room_update(receipt.room))
        }
        Err(e) => {
            warn!(room_id = %room_id, player_id = %player_id, error = %e, "Join over WebSocket failed");
            Some(WebSocketMessage::error(e.to_string(), e.code()))
        }
    };
    if let Some(message) = direct {
        if let Ok(message_json) = serde_json::to_string(&message) {
            let _ = outbound_sender.send(message_json);
        }
    }

    connection_id
}

/// Drops the socket's route. Disconnect counts as leaving, but only for the
/// player's current socket: a socket replaced by a reconnect leaves nothing.
pub async fn disconnect_player(
    app_state: &AppState,
    room_id: &str,
    player_id: &str,
    connection_id: Uuid,
) {
    let was_current = app_state
        .connection_manager
        .remove_connection(player_id, connection_id)
        .await;
    if !was_current {
        info!(
            room_id = %room_id,
            player_id = %player_id,
            connection_id = %connection_id,
            "Replaced connection closed, player stays seated"
        );
        return;
    }

    if let Err(e) = app_state.room_service.leave(player_id, Some(room_id)).await {
        warn!(room_id = %room_id, player_id = %player_id, error = %e, "Leave on disconnect failed");
    }
}
