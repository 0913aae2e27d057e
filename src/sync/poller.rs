use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::room::{models::RoomSnapshot, RoomService};
use crate::shared::AppError;

/// Anything that can report the current state of a room
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, room_id: &str) -> Result<RoomSnapshot, AppError>;
}

#[async_trait]
impl StatusSource for RoomService {
    async fn fetch_status(&self, room_id: &str) -> Result<RoomSnapshot, AppError> {
        self.get_status(room_id).await
    }
}

/// Pull-mode client loop.
///
/// Remembers the highest version seen, so a poll response that raced with
/// the client's own write (and carries an older version) never rolls the
/// view back.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    room_id: String,
    last_version: Option<u64>,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(room_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            room_id: room_id.into(),
            last_version: None,
            interval,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn last_version(&self) -> Option<u64> {
        self.last_version
    }

    /// Feeds a snapshot from any source (including the client's own
    /// mutation responses). Returns true when it is newer than anything seen.
    pub fn observe(&mut self, snapshot: &RoomSnapshot) -> bool {
        if self.last_version.is_some_and(|v| snapshot.version <= v) {
            return false;
        }
        self.last_version = Some(snapshot.version);
        true
    }

    /// Polls until the room changes. Errors end the loop, including
    /// `UnknownRoom` once the room is gone.
    pub async fn next_change<S>(&mut self, source: &S) -> Result<RoomSnapshot, AppError>
    where
        S: StatusSource + ?Sized,
    {
        loop {
            let snapshot = source.fetch_status(&self.room_id).await?;
            if self.observe(&snapshot) {
                return Ok(snapshot);
            }
            debug!(
                room_id = %self.room_id,
                version = snapshot.version,
                "No change since last poll"
            );
            tokio::time::sleep(self.interval).await;
        }
    }
}
