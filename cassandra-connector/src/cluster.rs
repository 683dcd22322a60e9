mod connection;
mod node;
pub mod session;

pub use self::connection::Connection;
pub use self::node::{Node, NodeDistance};
pub use self::session::Session;
