//! TCP connection management for the envelope protocol.

mod connection;

pub use connection::{Connection, ConnectionInfo, ConnectionSender};
