use serde::{Deserialize, Serialize};

use super::models::{RoomSnapshot, RoundResult};
use crate::shared::AppError;

/// Pull fields out of a loosely-typed body, so a missing field is a
/// `malformed-request` rather than a bare 422 from the extractor
fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::MalformedRequest(format!("{} is required", field)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub room_id: Option<String>,
    pub player_id: Option<String>,
    pub player_name: Option<String>,
}

impl JoinRequest {
    pub fn into_parts(self) -> Result<(String, String, String), AppError> {
        Ok((
            required(self.room_id, "roomId")?,
            required(self.player_id, "playerId")?,
            required(self.player_name, "playerName")?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRequest {
    pub room_id: Option<String>,
    pub player_id: Option<String>,
    pub choice: Option<String>,
}

impl ChoiceRequest {
    pub fn into_parts(self) -> Result<(String, String, String), AppError> {
        Ok((
            required(self.room_id, "roomId")?,
            required(self.player_id, "playerId")?,
            required(self.choice, "choice")?,
        ))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundRequest {
    pub room_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub room_id: Option<String>,
}

impl NextRoundRequest {
    pub fn room_id(self) -> Result<String, AppError> {
        required(self.room_id, "roomId")
    }
}

impl StatusQuery {
    pub fn room_id(self) -> Result<String, AppError> {
        required(self.room_id, "roomId")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub player_id: Option<String>,
    /// Optional; the player's current room is used when absent
    pub room_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoomEnvelope {
    pub room: RoomSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub room: RoomSnapshot,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<RoundResult>,
    /// Wire code of an ignored submission, e.g. `invalid-phase`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rejected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaveResponse {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub room: Option<RoomSnapshot>,
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfigResponse {
    pub sync_mode: String,
    pub poll_interval_ms: u64,
    pub results_display_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_are_malformed() {
        let request: JoinRequest =
            serde_json::from_str(r#"{"roomId":"ABC123","playerName":"Ann"}"#).unwrap();

        let err = request.into_parts().unwrap_err();
        assert_eq!(
            err,
            AppError::MalformedRequest("playerId is required".to_string())
        );
    }

    #[test]
    fn test_blank_fields_are_malformed() {
        let request = ChoiceRequest {
            room_id: Some("ABC123".to_string()),
            player_id: Some("p1".to_string()),
            choice: Some("  ".to_string()),
        };
        assert!(request.into_parts().is_err());
    }
}
