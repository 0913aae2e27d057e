use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod poller;

pub use poller::{StatusPoller, StatusSource};

/// How clients learn about room changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Server pushes events over a WebSocket; the server also drives the
    /// results timer
    #[default]
    Push,
    /// Clients poll `status`; rooms advance lazily when polled past their
    /// results deadline
    Pull,
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" | "ws" | "websocket" => Ok(SyncMode::Push),
            "pull" | "poll" | "http" => Ok(SyncMode::Pull),
            other => Err(format!("unknown sync mode '{}'", other)),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Push => write!(f, "push"),
            SyncMode::Pull => write!(f, "pull"),
        }
    }
}
