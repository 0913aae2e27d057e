use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info, instrument, warn};

use super::service::RoomService;
use crate::config::ServerConfig;

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to sweep for expired rooms
    pub cleanup_interval: Duration,
    /// Inactivity window after which a room is reclaimed
    pub room_ttl: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            room_ttl: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

impl From<&ServerConfig> for CleanupConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            cleanup_interval: config.cleanup_interval,
            room_ttl: config.room_ttl,
        }
    }
}

/// Starts the background task that periodically reclaims expired rooms.
///
/// The repository already hides expired rooms from reads; this sweep frees
/// their storage and tells any subscribers the room is gone.
#[instrument(skip(room_service))]
pub async fn start_cleanup_task(room_service: Arc<RoomService>, mut config: CleanupConfig) {
    if config.cleanup_interval.is_zero() {
        warn!("Zero cleanup interval, using the default");
        config.cleanup_interval = CleanupConfig::default().cleanup_interval;
    }

    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        room_ttl_secs = config.room_ttl.as_secs(),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;
        run_cleanup(&room_service).await;
    }
}

async fn run_cleanup(room_service: &RoomService) -> usize {
    match room_service.purge_expired_rooms().await {
        Ok(0) => {
            debug!("No expired rooms to clean up");
            0
        }
        Ok(deleted_count) => {
            info!(deleted_count = deleted_count, "Room cleanup completed");
            deleted_count
        }
        Err(e) => {
            error!(error = %e, "Room cleanup task failed");
            0
        }
    }
}
