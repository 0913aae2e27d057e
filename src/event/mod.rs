// Per-room event distribution: the push side of room synchronization.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::RoomEvent;
pub use room_handler::{RoomEventError, RoomEventHandler};
pub use room_subscription::{RoomSubscription, RoomSubscriptions};

// Internal modules
mod bus;
mod events;
mod room_handler;
mod room_subscription;
