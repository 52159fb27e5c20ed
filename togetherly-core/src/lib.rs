pub mod model;

pub use model::{ClientMessage, ConnectionId, RoomId, ServerMessage};
