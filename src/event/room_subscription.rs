use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{bus::EventBus, events::RoomEvent, room_handler::RoomEventHandler};

/// Manages room event subscriptions and routes events to handlers
pub struct RoomSubscription {
    room_id: String,
    handler: Arc<dyn RoomEventHandler>,
    event_bus: EventBus,
}

impl RoomSubscription {
    pub fn new(room_id: String, handler: Arc<dyn RoomEventHandler>, event_bus: EventBus) -> Self {
        Self {
            room_id,
            handler,
            event_bus,
        }
    }

    /// Start the subscription - spawns a background task that listens to room events
    /// and routes them to the handler until the room closes
    pub async fn start(self) -> JoinHandle<()> {
        let room_id = self.room_id.clone();
        let handler_name = self.handler.handler_name();

        info!(
            room_id = %room_id,
            handler = handler_name,
            "Starting room subscription"
        );

        let mut receiver = self.event_bus.subscribe_to_room(&room_id).await;

        tokio::spawn(async move {
            loop {
                let event = match receiver.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            room_id = %room_id,
                            handler = handler_name,
                            skipped = skipped,
                            "Room subscription lagged, events skipped"
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                let closed = matches!(event, RoomEvent::RoomClosed);

                if let Err(e) = self.handler.handle_room_event(&room_id, event).await {
                    warn!(
                        room_id = %room_id,
                        handler = handler_name,
                        error = %e,
                        "Room event handler failed"
                    );
                }

                if closed {
                    break;
                }
            }

            info!(
                room_id = %room_id,
                handler = handler_name,
                "Room subscription ended"
            );
        })
    }
}

/// Registry of running subscriptions, at most one per room
#[derive(Clone, Default)]
pub struct RoomSubscriptions {
    running: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
}

impl RoomSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a subscription for the room unless one is already live.
    ///
    /// A task still draining a closed channel does not count: once the
    /// room's channel is gone the next call starts over on a fresh one.
    pub async fn ensure(
        &self,
        room_id: &str,
        handler: Arc<dyn RoomEventHandler>,
        event_bus: &EventBus,
    ) {
        let mut running = self.running.lock().await;
        running.retain(|_, handle| !handle.is_finished());

        if running.contains_key(room_id) && event_bus.has_room_channel(room_id).await {
            return;
        }

        let handle = RoomSubscription::new(room_id.to_string(), handler, event_bus.clone())
            .start()
            .await;
        running.insert(room_id.to_string(), handle);
    }

    pub async fn is_running(&self, room_id: &str) -> bool {
        self.running
            .lock()
            .await
            .get(room_id)
            .is_some_and(|handle| !handle.is_finished())
    }
}
