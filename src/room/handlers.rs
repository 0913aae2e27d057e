use axum::{
    extract::{Query, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    code::generate_room_code,
    service::LeaveOutcome,
    types::{
        ChoiceRequest, ChoiceResponse, ClientConfigResponse, CreateRoomResponse, JoinRequest,
        LeaveRequest, LeaveResponse, NextRoundRequest, RoomEnvelope, StatusQuery,
    },
};
use crate::game::Move;
use crate::shared::{AppError, AppState};

/// POST /api/game/join
#[instrument(name = "join_room", skip(state, request))]
pub async fn join_room(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<RoomEnvelope>, AppError> {
    let (room_id, player_id, player_name) = request.into_parts()?;
    let room = state
        .room_service
        .join(&room_id, &player_id, &player_name)
        .await?;

    Ok(Json(RoomEnvelope { room }))
}

/// POST /api/game/choice
///
/// An out-of-phase choice still answers 200 with the current snapshot and
/// an `invalid-phase` marker; only bad input and unknown rooms are errors.
#[instrument(name = "submit_choice", skip(state, request))]
pub async fn submit_choice(
    State(state): State<AppState>,
    Json(request): Json<ChoiceRequest>,
) -> Result<Json<ChoiceResponse>, AppError> {
    let (room_id, player_id, raw_choice) = request.into_parts()?;
    let choice: Move = raw_choice
        .parse()
        .map_err(|e: crate::game::ParseMoveError| AppError::MalformedRequest(e.to_string()))?;

    let receipt = state
        .room_service
        .submit_choice(&room_id, &player_id, choice)
        .await?;

    Ok(Json(ChoiceResponse {
        room: receipt.room,
        result: receipt.result,
        rejected: receipt.rejected.map(|r| r.code().to_string()),
        reason: receipt.rejected.map(|r| r.to_string()),
    }))
}

/// POST /api/game/next-round
#[instrument(name = "next_round", skip(state, request))]
pub async fn next_round(
    State(state): State<AppState>,
    Json(request): Json<NextRoundRequest>,
) -> Result<Json<RoomEnvelope>, AppError> {
    let room_id = request.room_id()?;
    let room = state.room_service.advance_round(&room_id).await?;

    Ok(Json(RoomEnvelope { room }))
}

/// GET /api/game/status?roomId=
#[instrument(name = "room_status", skip(state, query))]
pub async fn room_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<RoomEnvelope>, AppError> {
    let room_id = query.room_id()?;
    let room = state.room_service.get_status(&room_id).await?;

    Ok(Json(RoomEnvelope { room }))
}

/// POST /api/game/leave
#[instrument(name = "leave_room", skip(state, request))]
pub async fn leave_room(
    State(state): State<AppState>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    let player_id = request
        .player_id
        .ok_or_else(|| AppError::MalformedRequest("playerId is required".to_string()))?;

    let outcome = state
        .room_service
        .leave(&player_id, request.room_id.as_deref())
        .await?;

    let response = match outcome {
        LeaveOutcome::Left(room) => LeaveResponse {
            room: Some(room),
            deleted: false,
        },
        LeaveOutcome::RoomDeleted => LeaveResponse {
            room: None,
            deleted: true,
        },
        LeaveOutcome::NotInRoom => LeaveResponse {
            room: None,
            deleted: false,
        },
    };

    Ok(Json(response))
}

/// POST /api/rooms
///
/// Hands out a fresh code. The room itself only exists once someone joins.
#[instrument(name = "create_room")]
pub async fn create_room() -> Json<CreateRoomResponse> {
    let room_id = generate_room_code();
    info!(room_id = %room_id, "Issued room code");

    Json(CreateRoomResponse { room_id })
}

/// GET /api/config
pub async fn client_config(State(state): State<AppState>) -> Json<ClientConfigResponse> {
    let config = &state.config;
    Json(ClientConfigResponse {
        sync_mode: config.sync_mode.to_string(),
        poll_interval_ms: config.poll_interval.as_millis() as u64,
        results_display_ms: config.results_display.as_millis() as u64,
    })
}
