// Module: ws

pub mod handler;
pub mod hub;
pub mod session;

pub use handler::websocket_handler;
pub use hub::{ConnectionId, ReadingHub, Subscriber};
pub use session::ConnectionSession;
