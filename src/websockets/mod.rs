// Public API
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use handler::{connect_player, disconnect_player, websocket_handler, WebsocketReceiveHandler};
pub use messages::{MessageType, WebSocketMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};
pub use websocket_room_subscriber::WebSocketRoomSubscriber;

// Internal modules
mod connection_manager;
mod handler;
mod messages;
mod socket;
mod websocket_room_subscriber;
