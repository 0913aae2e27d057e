use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::{Room, RoomChange};
use crate::shared::AppError;

/// A read-modify-write step applied to one room under exclusive access.
///
/// The slot is `None` when the room does not exist (or has expired). Leaving
/// `Some` after the call stores the room, leaving `None` deletes it.
pub type RoomMutator = Box<dyn FnOnce(&mut Option<Room>) -> RoomChange + Send>;

/// Trait for room repository operations
#[async_trait]
pub trait RoomRepository {
    /// Returns the live room, or `None` if absent or expired
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError>;

    /// Atomically applies `mutator` with respect to other updates of the same room
    async fn update_room(
        &self,
        room_id: &str,
        mutator: RoomMutator,
    ) -> Result<(Option<Room>, RoomChange), AppError>;

    /// Removes a room; returns whether a live room was deleted
    async fn delete_room(&self, room_id: &str) -> Result<bool, AppError>;

    /// Reclaims every room past its inactivity window
    async fn purge_expired(&self) -> Result<Vec<Room>, AppError>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex.lock().map_err(|_| {
        warn!("Room repository lock poisoned");
        AppError::Internal
    })
}

fn ttl_delta(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365))
}

struct Slot {
    room: Option<Room>,
    expires_at: DateTime<Utc>,
    /// Set once the slot has been unlinked from the map; holders must retry
    detached: bool,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            room: None,
            expires_at: DateTime::<Utc>::MIN_UTC,
            detached: false,
        }
    }

    fn live_room(&self, now: DateTime<Utc>) -> Option<Room> {
        self.room.clone().filter(|_| now < self.expires_at)
    }
}

/// In-memory implementation of RoomRepository.
///
/// Each room lives in its own slot with its own lock, so updates to different
/// rooms only share the brief map lookup.
pub struct InMemoryRoomRepository {
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
    ttl: Duration,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

impl InMemoryRoomRepository {
    /// Creates an empty repository whose rooms expire after `ttl` without writes
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of slots currently linked, live or not
    pub fn room_count(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn slot_for(
        &self,
        room_id: &str,
        create: bool,
    ) -> Result<Option<Arc<Mutex<Slot>>>, AppError> {
        let mut slots = lock(&self.slots)?;
        if create {
            let slot = slots
                .entry(room_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Slot::vacant())));
            Ok(Some(Arc::clone(slot)))
        } else {
            Ok(slots.get(room_id).cloned())
        }
    }

    /// Unlinks a slot whose lock the caller holds
    fn unlink(
        &self,
        room_id: &str,
        slot: &Arc<Mutex<Slot>>,
        guard: &mut Slot,
    ) -> Result<(), AppError> {
        guard.room = None;
        guard.detached = true;
        let mut slots = lock(&self.slots)?;
        if slots.get(room_id).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            slots.remove(room_id);
        }
        Ok(())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        let Some(slot) = self.slot_for(room_id, false)? else {
            debug!(room_id = %room_id, "Room not found in memory");
            return Ok(None);
        };

        let guard = lock(&slot)?;
        if guard.detached {
            return Ok(None);
        }

        let room = guard.live_room(Utc::now());
        if room.is_none() {
            debug!(room_id = %room_id, "Room absent or expired");
        }
        Ok(room)
    }

    #[instrument(skip(self, mutator))]
    async fn update_room(
        &self,
        room_id: &str,
        mutator: RoomMutator,
    ) -> Result<(Option<Room>, RoomChange), AppError> {
        let mut mutator = Some(mutator);

        loop {
            let slot = self.slot_for(room_id, true)?.ok_or(AppError::Internal)?;
            let mut guard = lock(&slot)?;

            // Lost a race with a delete; the map now holds a fresh slot
            if guard.detached {
                continue;
            }

            let now = Utc::now();
            let mut current = guard.live_room(now);
            let apply = mutator.take().ok_or(AppError::Internal)?;
            let change = apply(&mut current);

            return match current {
                Some(room) => {
                    guard.room = Some(room.clone());
                    guard.expires_at = now + ttl_delta(self.ttl);
                    debug!(
                        room_id = %room_id,
                        version = room.version,
                        change = ?change,
                        "Room updated in memory"
                    );
                    Ok((Some(room), change))
                }
                None => {
                    self.unlink(room_id, &slot, &mut guard)?;
                    debug!(room_id = %room_id, change = ?change, "Room slot released");
                    Ok((None, change))
                }
            };
        }
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: &str) -> Result<bool, AppError> {
        let (_, change) = self
            .update_room(
                room_id,
                Box::new(|room: &mut Option<Room>| match room.take() {
                    Some(_) => RoomChange::RoomEmptied,
                    None => RoomChange::NotFound,
                }),
            )
            .await?;

        Ok(change == RoomChange::RoomEmptied)
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> Result<Vec<Room>, AppError> {
        let candidates: Vec<(String, Arc<Mutex<Slot>>)> = lock(&self.slots)?
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(slot)))
            .collect();

        let now = Utc::now();
        let mut reclaimed = Vec::new();

        for (room_id, slot) in candidates {
            let mut guard = lock(&slot)?;
            if guard.detached || guard.live_room(now).is_some() {
                continue;
            }
            if let Some(room) = guard.room.take() {
                reclaimed.push(room);
            }
            self.unlink(&room_id, &slot, &mut guard)?;
        }

        if !reclaimed.is_empty() {
            info!(count = reclaimed.len(), "Reclaimed expired rooms from memory");
        }
        Ok(reclaimed)
    }
}

/// Postgres-backed RoomRepository: the external store with expiry.
///
/// Rooms are stored as JSON next to an `expires_at` column. Every update runs
/// in a transaction holding a per-room advisory lock, which also serializes
/// concurrent creation of a room that has no row yet.
pub struct PostgresRoomRepository {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Creates the rooms table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                state TEXT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create rooms table");
            AppError::from(e)
        })?;
        Ok(())
    }

    fn decode(room_id: &str, state: &str) -> Result<Room, AppError> {
        serde_json::from_str(state).map_err(|e| {
            warn!(room_id = %room_id, error = %e, "Stored room state is unreadable");
            AppError::Internal
        })
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<Room>, AppError> {
        let row = sqlx::query("SELECT state FROM rooms WHERE id = $1 AND expires_at > now()")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, room_id = %room_id, "Failed to fetch room from database");
                AppError::from(e)
            })?;

        match row {
            Some(row) => {
                let state: String = row.try_get("state")?;
                Ok(Some(Self::decode(room_id, &state)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, mutator))]
    async fn update_room(
        &self,
        room_id: &str,
        mutator: RoomMutator,
    ) -> Result<(Option<Room>, RoomChange), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(room_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query("SELECT state FROM rooms WHERE id = $1 AND expires_at > now()")
            .bind(room_id)
            .fetch_optional(&mut *tx)
            .await?;

        let mut current = match row {
            Some(row) => {
                let state: String = row.try_get("state")?;
                Some(Self::decode(room_id, &state)?)
            }
            None => None,
        };

        let change = mutator(&mut current);

        match &current {
            Some(room) => {
                let state = serde_json::to_string(room).map_err(|_| AppError::Internal)?;
                let expires_at = Utc::now() + ttl_delta(self.ttl);
                sqlx::query(
                    "INSERT INTO rooms (id, state, expires_at) VALUES ($1, $2, $3)
                     ON CONFLICT (id) DO UPDATE SET state = EXCLUDED.state, expires_at = EXCLUDED.expires_at",
                )
                .bind(room_id)
                .bind(state)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM rooms WHERE id = $1")
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        debug!(room_id = %room_id, change = ?change, "Room updated in database");
        Ok((current, change))
    }

    #[instrument(skip(self))]
    async fn delete_room(&self, room_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1 AND expires_at > now()")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self) -> Result<Vec<Room>, AppError> {
        let rows = sqlx::query("DELETE FROM rooms WHERE expires_at <= now() RETURNING id, state")
            .fetch_all(&self.pool)
            .await?;

        let mut reclaimed = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id")?;
            let state: String = row.try_get("state")?;
            match Self::decode(&id, &state) {
                Ok(room) => reclaimed.push(room),
                Err(_) => warn!(room_id = %id, "Dropped unreadable expired room"),
            }
        }

        if !reclaimed.is_empty() {
            info!(count = reclaimed.len(), "Reclaimed expired rooms from database");
        }
        Ok(reclaimed)
    }
}
