use std::fmt;
use std::str::FromStr;
use strum_macros::EnumIter;

/// A hand shape a player can throw in a round
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Stone,
    Paper,
    Scissors,
}

impl Move {
    /// The move this one defeats
    pub fn beats(self) -> Move {
        match self {
            Move::Stone => Move::Scissors,
            Move::Paper => Move::Stone,
            Move::Scissors => Move::Paper,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Move::Stone => "stone",
                Move::Paper => "paper",
                Move::Scissors => "scissors",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown move: {0}")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stone" | "rock" => Ok(Move::Stone),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}
