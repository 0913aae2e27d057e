// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use handlers::{
    client_config, create_room, join_room, leave_room, next_round, room_status, submit_choice,
};
pub use models::{Phase, Rejection, Room, RoomChange, RoomSnapshot, RoundResult};
pub use repository::{InMemoryRoomRepository, PostgresRoomRepository, RoomRepository};
pub use service::{ChoiceReceipt, JoinReceipt, LeaveOutcome, RoomService};

// Internal modules
mod cleanup_task;
pub mod code;
mod handlers;
pub mod models;
pub mod repository;
mod round_scheduler;
mod service;
mod types;
