use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::sync::SyncMode;

/// Which repository backend holds canonical room state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStore {
    Memory,
    Postgres,
}

impl FromStr for RoomStore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(RoomStore::Memory),
            "postgres" | "postgresql" => Ok(RoomStore::Postgres),
            other => Err(other.to_string()),
        }
    }
}

/// Server settings, read from the environment once at start-up
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub room_store: RoomStore,
    pub database_url: Option<String>,
    /// Inactivity window after which a room is reclaimed
    pub room_ttl: Duration,
    /// How long a round's result stays on screen
    pub results_display: Duration,
    pub cleanup_interval: Duration,
    pub sync_mode: SyncMode,
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            room_store: RoomStore::Memory,
            database_url: None,
            room_ttl: Duration::from_secs(60 * 60), // 1 hour
            results_display: Duration::from_millis(3000),
            cleanup_interval: Duration::from_secs(60),
            sync_mode: SyncMode::Push,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparseable values keep the default
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            room_store: parse_or(&lookup, "ROOM_STORE", defaults.room_store),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            room_ttl: Duration::from_secs(parse_nonzero_or(
                &lookup,
                "ROOM_TTL_SECS",
                defaults.room_ttl.as_secs(),
            )),
            results_display: Duration::from_millis(parse_or(
                &lookup,
                "RESULTS_DISPLAY_MS",
                defaults.results_display.as_millis() as u64,
            )),
            cleanup_interval: Duration::from_secs(parse_nonzero_or(
                &lookup,
                "CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval.as_secs(),
            )),
            sync_mode: parse_or(&lookup, "SYNC_MODE", defaults.sync_mode),
            poll_interval: Duration::from_millis(parse_nonzero_or(
                &lookup,
                "POLL_INTERVAL_MS",
                defaults.poll_interval.as_millis() as u64,
            )),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, "Ignoring unparseable config value");
            default
        }),
        None => default,
    }
}

/// Like `parse_or`, for periods where zero would stall or panic a timer
fn parse_nonzero_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default) {
        0 => {
            warn!(key = %key, "Ignoring zero config value");
            default
        }
        value => value,
    }
}
