use rand::Rng;

use super::models::MAX_NAME_CHARS;
use crate::shared::AppError;

/// Generated codes use this many characters
pub const ROOM_CODE_LEN: usize = 6;

/// Longest room id a client may supply
pub const MAX_ROOM_ID_LEN: usize = 16;

// No 0/O or 1/I so codes survive being read aloud
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// A fresh room code such as `K7PQ2M`
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a client-supplied room id. Ids are case-insensitive.
pub fn normalize_room_id(raw: &str) -> Result<String, AppError> {
    let id = raw.trim().to_ascii_uppercase();

    if id.is_empty() {
        return Err(AppError::MalformedRequest("roomId is required".to_string()));
    }
    if id.len() > MAX_ROOM_ID_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::MalformedRequest(format!(
            "roomId must be 1-{} letters or digits",
            MAX_ROOM_ID_LEN
        )));
    }
    Ok(id)
}

pub fn normalize_player_id(raw: &str) -> Result<String, AppError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::MalformedRequest("playerId is required".to_string()));
    }
    Ok(id.to_string())
}

/// Trims the display name and cuts it to the maximum length
pub fn normalize_player_name(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::MalformedRequest(
            "playerName is required".to_string(),
        ));
    }
    Ok(name.chars().take(MAX_NAME_CHARS).collect())
}
