use serde::{Deserialize, Serialize};

use super::moves::Move;

/// Result of one round, attributed by seat rather than by player id.
///
/// `Player1` is whoever sits at position 0 of the room, `Player2` at position 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Player1,
    Player2,
    Tie,
}

impl Outcome {
    /// The same round seen from the other seat
    pub fn swapped(self) -> Outcome {
        match self {
            Outcome::Player1 => Outcome::Player2,
            Outcome::Player2 => Outcome::Player1,
            Outcome::Tie => Outcome::Tie,
        }
    }

    /// Seat index of the winner, if any
    pub fn winner_seat(self) -> Option<usize> {
        match self {
            Outcome::Player1 => Some(0),
            Outcome::Player2 => Some(1),
            Outcome::Tie => None,
        }
    }
}

/// Decide a round. Pure and total over all nine move pairs.
pub fn resolve(first: Move, second: Move) -> Outcome {
    if first == second {
        Outcome::Tie
    } else if first.beats() == second {
        Outcome::Player1
    } else {
        Outcome::Player2
    }
}
