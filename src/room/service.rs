use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    code::{normalize_player_id, normalize_player_name, normalize_room_id},
    models::{Phase, Rejection, Room, RoomChange, RoomSnapshot, RoundResult},
    repository::RoomRepository,
    round_scheduler::RoundScheduler,
};
use crate::{
    config::ServerConfig,
    event::{EventBus, RoomEvent},
    game::Move,
    shared::AppError,
    sync::SyncMode,
    user::PlayerDirectory,
};

/// Result of a choice submission. A rejected choice is not an error: the
/// caller gets the unchanged snapshot and the reason it was ignored.
#[derive(Debug, Clone)]
pub struct ChoiceReceipt {
    pub room: RoomSnapshot,
    pub result: Option<RoundResult>,
    pub rejected: Option<Rejection>,
}

/// Result of seating a player
#[derive(Debug, Clone)]
pub struct JoinReceipt {
    pub room: RoomSnapshot,
    /// Whether a room subscriber received this join's snapshot
    pub announced: bool,
}

/// Result of a leave request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The player left; the remaining player is back in waiting
    Left(RoomSnapshot),
    /// The last player left and the room is gone
    RoomDeleted,
    /// The player was not seated anywhere
    NotInRoom,
}

/// The room session manager: every operation is a single atomic
/// read-modify-write against the repository, followed by an event carrying
/// the committed snapshot.
#[derive(Clone)]
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    directory: Arc<dyn PlayerDirectory>,
    event_bus: EventBus,
    scheduler: RoundScheduler,
    results_display: Duration,
    auto_advance: bool,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        directory: Arc<dyn PlayerDirectory>,
        event_bus: EventBus,
        config: &ServerConfig,
    ) -> Self {
        Self {
            repository,
            directory,
            event_bus,
            scheduler: RoundScheduler::new(),
            results_display: config.results_display,
            auto_advance: config.sync_mode == SyncMode::Push,
        }
    }

    fn display_window(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.results_display)
            .unwrap_or_else(|_| chrono::Duration::seconds(3))
    }

    /// Seats the player, creating the room on first join. A full room is
    /// left untouched and its snapshot returned.
    pub async fn join(
        &self,
        room_id: &str,
        player_id: &str,
        player_name: &str,
    ) -> Result<RoomSnapshot, AppError> {
        self.seat(room_id, player_id, player_name)
            .await
            .map(|receipt| receipt.room)
    }

    /// Like `join`, but also reports whether the snapshot went out as an event
    #[instrument(skip(self))]
    pub async fn seat(
        &self,
        room_id: &str,
        player_id: &str,
        player_name: &str,
    ) -> Result<JoinReceipt, AppError> {
        let room_id = normalize_room_id(room_id)?;
        let player_id = normalize_player_id(player_id)?;
        let player_name = normalize_player_name(player_name)?;

        if let Some(previous) = self.directory.room_of(&player_id).await {
            if previous != room_id {
                info!(
                    player_id = %player_id,
                    previous_room = %previous,
                    room_id = %room_id,
                    "Player switching rooms, leaving previous room"
                );
                self.leave_room(&previous, &player_id).await?;
            }
        }

        let (room, change) = {
            let new_id = room_id.clone();
            let player_id = player_id.clone();
            self.repository
                .update_room(
                    &room_id,
                    Box::new(move |slot: &mut Option<Room>| {
                        let now = Utc::now();
                        slot.get_or_insert_with(|| Room::new(new_id, now))
                            .join(&player_id, &player_name, now)
                    }),
                )
                .await?
        };
        let room = room.ok_or(AppError::Internal)?;

        let announced = match change {
            RoomChange::Joined { started } => {
                self.directory.assign(&player_id, &room_id).await;
                info!(
                    room_id = %room_id,
                    player_id = %player_id,
                    players = room.players.len(),
                    started = started,
                    "Player joined room"
                );
                self.event_bus
                    .emit_to_room(
                        &room_id,
                        RoomEvent::PlayerJoined {
                            player_id,
                            started,
                            room: room.snapshot(),
                        },
                    )
                    .await
            }
            RoomChange::AlreadyJoined => {
                self.directory.assign(&player_id, &room_id).await;
                debug!(room_id = %room_id, player_id = %player_id, "Player already seated");
                false
            }
            RoomChange::RoomFull => {
                warn!(room_id = %room_id, player_id = %player_id, "Room is full, join ignored");
                false
            }
            other => {
                warn!(room_id = %room_id, change = ?other, "Unexpected join outcome");
                false
            }
        };

        Ok(JoinReceipt {
            room: room.snapshot(),
            announced,
        })
    }

    /// Records a move for the current round; the second move scores it
    #[instrument(skip(self))]
    pub async fn submit_choice(
        &self,
        room_id: &str,
        player_id: &str,
        choice: Move,
    ) -> Result<ChoiceReceipt, AppError> {
        let room_id = normalize_room_id(room_id)?;
        let player_id = normalize_player_id(player_id)?;
        let display = self.display_window();

        let (room, change) = {
            let player_id = player_id.clone();
            self.repository
                .update_room(
                    &room_id,
                    Box::new(move |slot: &mut Option<Room>| match slot {
                        Some(room) => room.submit_choice(&player_id, choice, Utc::now(), display),
                        None => RoomChange::NotFound,
                    }),
                )
                .await?
        };
        let room = room.ok_or_else(|| AppError::UnknownRoom(room_id.clone()))?;
        let snapshot = room.snapshot();

        let receipt = match change {
            RoomChange::ChoiceRecorded => {
                debug!(room_id = %room_id, player_id = %player_id, "Choice recorded");
                self.event_bus
                    .emit_to_room(
                        &room_id,
                        RoomEvent::PlayerChose {
                            player_id,
                            room: snapshot.clone(),
                        },
                    )
                    .await;
                ChoiceReceipt {
                    room: snapshot,
                    result: None,
                    rejected: None,
                }
            }
            RoomChange::RoundCompleted(result) => {
                info!(
                    room_id = %room_id,
                    round = result.round,
                    winner = ?result.winner,
                    "Round completed"
                );
                self.event_bus
                    .emit_to_room(
                        &room_id,
                        RoomEvent::RoundCompleted {
                            result: result.clone(),
                            room: snapshot.clone(),
                        },
                    )
                    .await;
                if self.auto_advance {
                    self.schedule_advance(&room_id, result.round);
                }
                ChoiceReceipt {
                    room: snapshot,
                    result: Some(result),
                    rejected: None,
                }
            }
            RoomChange::ChoiceRejected(reason) => {
                debug!(
                    room_id = %room_id,
                    player_id = %player_id,
                    reason = %reason,
                    "Choice ignored"
                );
                ChoiceReceipt {
                    room: snapshot,
                    result: None,
                    rejected: Some(reason),
                }
            }
            other => {
                warn!(room_id = %room_id, change = ?other, "Unexpected choice outcome");
                ChoiceReceipt {
                    room: snapshot,
                    result: None,
                    rejected: None,
                }
            }
        };

        Ok(receipt)
    }

    /// Starts the next round if the room is showing results; otherwise a no-op
    #[instrument(skip(self))]
    pub async fn advance_round(&self, room_id: &str) -> Result<RoomSnapshot, AppError> {
        let room_id = normalize_room_id(room_id)?;
        let (room, change) = self.advance_guarded(&room_id, None).await?;
        let room = room.ok_or_else(|| AppError::UnknownRoom(room_id.clone()))?;

        if change == RoomChange::RoundAdvanced {
            self.scheduler.cancel(&room_id);
        }
        Ok(room.snapshot())
    }

    /// Advances only if the room is still showing the results of
    /// `expected_round`. Never recreates a deleted room.
    pub async fn advance_if_due(
        &self,
        room_id: &str,
        expected_round: u32,
    ) -> Result<Option<RoomSnapshot>, AppError> {
        let (room, change) = self.advance_guarded(room_id, Some(expected_round)).await?;
        Ok(room
            .filter(|_| change == RoomChange::RoundAdvanced)
            .map(|r| r.snapshot()))
    }

    async fn advance_guarded(
        &self,
        room_id: &str,
        expected_round: Option<u32>,
    ) -> Result<(Option<Room>, RoomChange), AppError> {
        let (room, change) = self
            .repository
            .update_room(
                room_id,
                Box::new(move |slot: &mut Option<Room>| match slot {
                    Some(room) if expected_round.is_some_and(|r| r != room.round) => {
                        RoomChange::AdvanceSkipped
                    }
                    Some(room) => room.advance(Utc::now()),
                    None => RoomChange::NotFound,
                }),
            )
            .await?;

        match (&room, &change) {
            (Some(room), RoomChange::RoundAdvanced) => {
                info!(room_id = %room_id, round = room.round, "Round advanced");
                self.event_bus
                    .emit_to_room(
                        room_id,
                        RoomEvent::RoundAdvanced {
                            room: room.snapshot(),
                        },
                    )
                    .await;
            }
            _ => {
                debug!(room_id = %room_id, change = ?change, "Advance skipped");
            }
        }

        Ok((room, change))
    }

    fn schedule_advance(&self, room_id: &str, round: u32) {
        let service = self.clone();
        let target = room_id.to_string();

        self.scheduler
            .schedule(room_id, self.results_display, async move {
                match service.advance_if_due(&target, round).await {
                    Ok(Some(_)) => debug!(room_id = %target, "Scheduled advance applied"),
                    Ok(None) => debug!(room_id = %target, "Scheduled advance was stale"),
                    Err(e) => warn!(room_id = %target, error = %e, "Scheduled advance failed"),
                }
            });
    }

    /// Current snapshot. A room whose results window has elapsed is
    /// advanced on the way out, so polling clients need no server timer.
    #[instrument(skip(self))]
    pub async fn get_status(&self, room_id: &str) -> Result<RoomSnapshot, AppError> {
        let room_id = normalize_room_id(room_id)?;
        let room = self
            .repository
            .get_room(&room_id)
            .await?
            .ok_or_else(|| AppError::UnknownRoom(room_id.clone()))?;

        if room.is_results_due(Utc::now()) {
            if let Some(advanced) = self.advance_if_due(&room_id, room.round).await? {
                return Ok(advanced);
            }
            // Someone else moved the room on; report what is there now
            return self
                .repository
                .get_room(&room_id)
                .await?
                .map(|r| r.snapshot())
                .ok_or(AppError::UnknownRoom(room_id));
        }

        Ok(room.snapshot())
    }

    /// Unseats the player from `room_id`, or from whatever room the
    /// directory has them in when no room is given
    #[instrument(skip(self))]
    pub async fn leave(
        &self,
        player_id: &str,
        room_id: Option<&str>,
    ) -> Result<LeaveOutcome, AppError> {
        let player_id = normalize_player_id(player_id)?;
        let room_id = match room_id {
            Some(raw) => normalize_room_id(raw)?,
            None => match self.directory.room_of(&player_id).await {
                Some(room_id) => room_id,
                None => {
                    debug!(player_id = %player_id, "Leave for player in no room");
                    return Ok(LeaveOutcome::NotInRoom);
                }
            },
        };

        self.leave_room(&room_id, &player_id).await
    }

    async fn leave_room(&self, room_id: &str, player_id: &str) -> Result<LeaveOutcome, AppError> {
        let (room, change) = {
            let player_id = player_id.to_string();
            self.repository
                .update_room(
                    room_id,
                    Box::new(move |slot: &mut Option<Room>| {
                        let change = match slot {
                            Some(room) => room.leave(&player_id, Utc::now()),
                            None => RoomChange::NotFound,
                        };
                        if change == RoomChange::RoomEmptied {
                            *slot = None;
                        }
                        change
                    }),
                )
                .await?
        };

        self.directory.release(player_id, room_id).await;

        match (room, change) {
            (Some(room), RoomChange::PlayerLeft) => {
                self.scheduler.cancel(room_id);
                info!(
                    room_id = %room_id,
                    player_id = %player_id,
                    remaining = room.players.len(),
                    "Player left, room back to waiting"
                );
                let snapshot = room.snapshot();
                self.event_bus
                    .emit_to_room(
                        room_id,
                        RoomEvent::PlayerLeft {
                            player_id: player_id.to_string(),
                            room: snapshot.clone(),
                        },
                    )
                    .await;
                Ok(LeaveOutcome::Left(snapshot))
            }
            (_, RoomChange::RoomEmptied) => {
                info!(room_id = %room_id, player_id = %player_id, "Last player left, room deleted");
                self.close_room(room_id).await;
                Ok(LeaveOutcome::RoomDeleted)
            }
            (_, change) => {
                debug!(room_id = %room_id, player_id = %player_id, change = ?change, "Leave was a no-op");
                Ok(LeaveOutcome::NotInRoom)
            }
        }
    }

    async fn close_room(&self, room_id: &str) {
        self.scheduler.cancel(room_id);
        self.event_bus.close_room(room_id).await;
    }

    /// Reclaims rooms past their inactivity window; returns how many went
    #[instrument(skip(self))]
    pub async fn purge_expired_rooms(&self) -> Result<usize, AppError> {
        let reclaimed = self.repository.purge_expired().await?;

        for room in &reclaimed {
            for player_id in room.player_ids() {
                self.directory.release(&player_id, &room.id).await;
            }
            self.close_room(&room.id).await;
            info!(room_id = %room.id, "Expired room reclaimed");
        }

        Ok(reclaimed.len())
    }

    /// Whether a round-advance timer is pending for the room
    pub fn has_pending_advance(&self, room_id: &str) -> bool {
        self.scheduler.is_pending(room_id)
    }

    /// Phase of the room, if it exists; convenience for transports
    pub async fn phase_of(&self, room_id: &str) -> Result<Option<Phase>, AppError> {
        let room_id = normalize_room_id(room_id)?;
        Ok(self.repository.get_room(&room_id).await?.map(|r| r.phase))
    }
}
