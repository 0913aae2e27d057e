use crate::room::models::{RoomSnapshot, RoundResult};

/// Events that have happened to a room.
///
/// Every event carries the snapshot committed by the mutation that produced
/// it, so subscribers never need to re-read the repository and can never
/// observe an older state than the write that caused the event.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A player took a seat; `started` is set when this filled the room
    PlayerJoined {
        player_id: String,
        started: bool,
        room: RoomSnapshot,
    },

    /// A player left and others remain; the match restarted from waiting
    PlayerLeft { player_id: String, room: RoomSnapshot },

    /// A player locked in a move. Carries no move.
    PlayerChose { player_id: String, room: RoomSnapshot },

    /// Both moves are in and the round was scored
    RoundCompleted {
        result: RoundResult,
        room: RoomSnapshot,
    },

    /// The room moved from results into a new round
    RoundAdvanced { room: RoomSnapshot },

    /// The last player left or the room was reclaimed
    RoomClosed,
}

impl RoomEvent {
    /// Get a human-readable description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::PlayerJoined { .. } => "player_joined",
            RoomEvent::PlayerLeft { .. } => "player_left",
            RoomEvent::PlayerChose { .. } => "player_chose",
            RoomEvent::RoundCompleted { .. } => "round_completed",
            RoomEvent::RoundAdvanced { .. } => "round_advanced",
            RoomEvent::RoomClosed => "room_closed",
        }
    }

    /// Snapshot carried by the event, if the room still exists
    pub fn room(&self) -> Option<&RoomSnapshot> {
        match self {
            RoomEvent::PlayerJoined { room, .. }
            | RoomEvent::PlayerLeft { room, .. }
            | RoomEvent::PlayerChose { room, .. }
            | RoomEvent::RoundCompleted { room, .. }
            | RoomEvent::RoundAdvanced { room } => Some(room),
            RoomEvent::RoomClosed => None,
        }
    }
}
