use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::game::{resolve, Move, Outcome};

/// Rooms hold at most two seated players
pub const MAX_PLAYERS: usize = 2;

/// Display names are cut to this many characters
pub const MAX_NAME_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub score: u32,
}

impl Player {
    pub fn new(id: String, name: String) -> Self {
        Self { id, name, score: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Playing,
    Results,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Phase::Waiting => "waiting",
                Phase::Playing => "playing",
                Phase::Results => "results",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatChoice {
    pub player_id: String,
    pub choice: Move,
}

/// Outcome of a completed round, including both revealed moves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub round: u32,
    /// Seat order: index 0 is player1
    pub choices: Vec<SeatChoice>,
    pub winner: Outcome,
    pub winner_id: Option<String>,
    pub scores: BTreeMap<String, u32>,
}

/// Why a choice submission was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotPlaying,
    NotInRoom,
    AlreadyChosen,
}

impl Rejection {
    /// Wire code; every rejection is an invalid-phase from the client's view
    pub fn code(&self) -> &'static str {
        "invalid-phase"
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotPlaying => write!(f, "Room is not accepting choices"),
            Rejection::NotInRoom => write!(f, "Player is not seated in this room"),
            Rejection::AlreadyChosen => write!(f, "Player already chose this round"),
        }
    }
}

/// What a single mutation did to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomChange {
    Joined { started: bool },
    AlreadyJoined,
    RoomFull,
    ChoiceRecorded,
    RoundCompleted(RoundResult),
    ChoiceRejected(Rejection),
    RoundAdvanced,
    AdvanceSkipped,
    PlayerLeft,
    NotInRoom,
    RoomEmptied,
    NotFound,
}

/// Canonical room record as owned by the repository.
///
/// Seat order in `players` is stable: players are only appended while the room
/// has a free seat and only removed on leave, so index 0 is always player1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    pub phase: Phase,
    pub pending_choices: HashMap<String, Move>,
    pub round: u32,
    pub last_result: Option<RoundResult>,
    pub version: u64,
    pub last_activity: DateTime<Utc>,
    pub results_deadline: Option<DateTime<Utc>>,
}

impl Room {
    pub fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            players: Vec::with_capacity(MAX_PLAYERS),
            phase: Phase::Waiting,
            pending_choices: HashMap::new(),
            round: 0,
            last_result: None,
            version: 0,
            last_activity: now,
            results_deadline: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.seat_of(player_id).is_some()
    }

    /// 0 for player1, 1 for player2
    pub fn seat_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    pub fn has_chosen(&self, player_id: &str) -> bool {
        self.pending_choices.contains_key(player_id)
    }

    /// True once the results window has elapsed and the room may advance
    pub fn is_results_due(&self, now: DateTime<Utc>) -> bool {
        self.phase == Phase::Results && self.results_deadline.is_some_and(|d| now >= d)
    }

    /// Versions are millisecond timestamps bumped to stay strictly increasing,
    /// so a room recreated under the same id never reuses an old version
    fn touch(&mut self, now: DateTime<Utc>) {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.version = (self.version + 1).max(millis);
        self.last_activity = now;
    }

    fn start_round(&mut self) {
        self.pending_choices.clear();
        self.last_result = None;
        self.results_deadline = None;
        self.round += 1;
        self.phase = Phase::Playing;
    }

    /// Seat a player. Rejoining keeps the existing seat and score.
    pub fn join(&mut self, player_id: &str, name: &str, now: DateTime<Utc>) -> RoomChange {
        if self.has_player(player_id) {
            self.last_activity = now;
            return RoomChange::AlreadyJoined;
        }
        if self.is_full() {
            return RoomChange::RoomFull;
        }

        self.players
            .push(Player::new(player_id.to_string(), name.to_string()));

        let started = self.is_full() && self.phase == Phase::Waiting;
        if started {
            self.round = 0;
            self.start_round();
        }

        self.touch(now);
        RoomChange::Joined { started }
    }

    /// Record a move. The second distinct move resolves the round.
    pub fn submit_choice(
        &mut self,
        player_id: &str,
        choice: Move,
        now: DateTime<Utc>,
        results_display: Duration,
    ) -> RoomChange {
        if self.phase != Phase::Playing || !self.is_full() {
            return RoomChange::ChoiceRejected(Rejection::NotPlaying);
        }
        if !self.has_player(player_id) {
            return RoomChange::ChoiceRejected(Rejection::NotInRoom);
        }
        if self.has_chosen(player_id) {
            return RoomChange::ChoiceRejected(Rejection::AlreadyChosen);
        }

        self.pending_choices.insert(player_id.to_string(), choice);
        self.touch(now);

        match self.resolve_round() {
            Some(result) => {
                self.phase = Phase::Results;
                self.results_deadline = Some(now + results_display);
                self.last_result = Some(result.clone());
                RoomChange::RoundCompleted(result)
            }
            None => RoomChange::ChoiceRecorded,
        }
    }

    fn resolve_round(&mut self) -> Option<RoundResult> {
        let first = *self.pending_choices.get(&self.players[0].id)?;
        let second = *self.pending_choices.get(&self.players[1].id)?;

        let winner = resolve(first, second);
        let winner_id = winner.winner_seat().map(|seat| {
            let player = &mut self.players[seat];
            player.score += 1;
            player.id.clone()
        });

        Some(RoundResult {
            round: self.round,
            choices: vec![
                SeatChoice {
                    player_id: self.players[0].id.clone(),
                    choice: first,
                },
                SeatChoice {
                    player_id: self.players[1].id.clone(),
                    choice: second,
                },
            ],
            winner,
            winner_id,
            scores: self
                .players
                .iter()
                .map(|p| (p.id.clone(), p.score))
                .collect(),
        })
    }

    /// Move from results to the next round. Only the first caller wins.
    pub fn advance(&mut self, now: DateTime<Utc>) -> RoomChange {
        if self.phase != Phase::Results {
            return RoomChange::AdvanceSkipped;
        }
        self.start_round();
        self.touch(now);
        RoomChange::RoundAdvanced
    }

    /// Unseat a player; any departure restarts the match from waiting.
    pub fn leave(&mut self, player_id: &str, now: DateTime<Utc>) -> RoomChange {
        let Some(seat) = self.seat_of(player_id) else {
            return RoomChange::NotInRoom;
        };

        self.players.remove(seat);
        self.pending_choices.clear();
        self.last_result = None;
        self.results_deadline = None;
        self.phase = Phase::Waiting;
        self.round = 0;
        self.touch(now);

        if self.is_empty() {
            RoomChange::RoomEmptied
        } else {
            RoomChange::PlayerLeft
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub has_chosen: bool,
}

/// What clients are allowed to see of a room. Pending moves appear only as
/// `hasChosen` flags; the moves themselves are revealed through `lastResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub players: Vec<PlayerView>,
    pub phase: Phase,
    pub round: u32,
    pub version: u64,
    pub last_activity: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_result: Option<RoundResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub results_deadline: Option<DateTime<Utc>>,
}

impl RoomSnapshot {
    pub fn player_ids(&self) -> Vec<String> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        let in_results = room.phase == Phase::Results;
        Self {
            id: room.id.clone(),
            players: room
                .players
                .iter()
                .map(|p| PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    score: p.score,
                    has_chosen: room.has_chosen(&p.id),
                })
                .collect(),
            phase: room.phase,
            round: room.round,
            version: room.version,
            last_activity: room.last_activity,
            last_result: room.last_result.clone().filter(|_| in_results),
            results_deadline: room.results_deadline.filter(|_| in_results),
        }
    }
}
