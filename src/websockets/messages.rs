use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::room::models::{RoomSnapshot, RoundResult};

/// Message types for WebSocket communication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    MakeChoice,
    Leave,

    // Both directions: a request from the client, an announcement from us
    NextRound,

    // Server -> Client
    RoomUpdate,
    GameStart,
    PlayerChose,
    RoundResults,
    PlayerLeft,
    Error,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<u64>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakeChoicePayload {
    pub choice: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPayload {
    pub room: RoomSnapshot,
}

/// Names who locked in. Carries no move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerChosePayload {
    pub player_id: String,
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResultsPayload {
    pub result: RoundResult,
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLeftPayload {
    pub player_id: String,
    pub room: RoomSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub code: String,
}

fn to_payload<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                version: None,
            }),
        }
    }

    fn with_room(message_type: MessageType, payload: Value, room: &RoomSnapshot) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
                version: Some(room.version),
            }),
        }
    }

    pub fn room_update(room: RoomSnapshot) -> Self {
        let payload = to_payload(RoomPayload { room: room.clone() });
        Self::with_room(MessageType::RoomUpdate, payload, &room)
    }

    pub fn game_start(room: RoomSnapshot) -> Self {
        let payload = to_payload(RoomPayload { room: room.clone() });
        Self::with_room(MessageType::GameStart, payload, &room)
    }

    pub fn player_chose(player_id: String, room: RoomSnapshot) -> Self {
        let payload = to_payload(PlayerChosePayload {
            player_id,
            room: room.clone(),
        });
        Self::with_room(MessageType::PlayerChose, payload, &room)
    }

    pub fn round_results(result: RoundResult, room: RoomSnapshot) -> Self {
        let payload = to_payload(RoundResultsPayload {
            result,
            room: room.clone(),
        });
        Self::with_room(MessageType::RoundResults, payload, &room)
    }

    pub fn next_round(room: RoomSnapshot) -> Self {
        let payload = to_payload(RoomPayload { room: room.clone() });
        Self::with_room(MessageType::NextRound, payload, &room)
    }

    pub fn player_left(player_id: String, room: RoomSnapshot) -> Self {
        let payload = to_payload(PlayerLeftPayload {
            player_id,
            room: room.clone(),
        });
        Self::with_room(MessageType::PlayerLeft, payload, &room)
    }

    /// Create an ERROR message
    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        let payload = ErrorPayload {
            message: message.into(),
            code: code.into(),
        };
        Self::new(MessageType::Error, to_payload(payload))
    }

    /// Create a MAKE_CHOICE message, as a client would send it
    pub fn make_choice(choice: impl Into<String>) -> Self {
        let payload = MakeChoicePayload {
            choice: choice.into(),
        };
        Self::new(MessageType::MakeChoice, to_payload(payload))
    }

    /// Create a LEAVE message, as a client would send it
    pub fn leave() -> Self {
        Self::new(MessageType::Leave, Value::Null)
    }

    /// Create a NEXT_ROUND request, as a client would send it
    pub fn next_round_request() -> Self {
        Self::new(MessageType::NextRound, Value::Null)
    }
}
