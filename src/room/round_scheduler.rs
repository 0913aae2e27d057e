use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;

struct Pending {
    generation: u64,
    handle: AbortHandle,
}

/// Deferred per-room actions, at most one pending per room.
///
/// Scheduling replaces (and aborts) whatever was pending for the room.
/// Tasks are also expected to re-check room state when they fire, since a
/// cancel can race with a task that has already woken up.
#[derive(Clone, Default)]
pub struct RoundScheduler {
    pending: Arc<Mutex<HashMap<String, Pending>>>,
    generations: Arc<AtomicU64>,
}

impl RoundScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` unless cancelled first
    pub fn schedule<F>(&self, room_id: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let key = room_id.to_string();

        // The entry must exist before the task can try to clear it
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());

        let tasks = Arc::clone(&self.pending);
        let join = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;

            let mut pending = tasks.lock().unwrap_or_else(|e| e.into_inner());
            if pending.get(&key).is_some_and(|p| p.generation == generation) {
                pending.remove(&key);
            }
        });

        let replaced = pending.insert(
            room_id.to_string(),
            Pending {
                generation,
                handle: join.abort_handle(),
            },
        );
        drop(pending);
        if let Some(old) = replaced {
            old.handle.abort();
        }

        debug!(room_id = %room_id, delay_ms = delay.as_millis() as u64, "Round action scheduled");
    }

    /// Aborts the room's pending action; returns whether one was pending
    pub fn cancel(&self, room_id: &str) -> bool {
        let Ok(mut pending) = self.pending.lock() else {
            return false;
        };
        match pending.remove(room_id) {
            Some(p) => {
                p.handle.abort();
                debug!(room_id = %room_id, "Round action cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, room_id: &str) -> bool {
        self.pending
            .lock()
            .map(|p| p.contains_key(room_id))
            .unwrap_or(false)
    }
}
