//! rcon-transport: Remote console connections
//!
//! Provides the `Connection` trait and one implementation per protocol
//! family: Source RCON, WebSocket RCON and telnet consoles.

pub mod connector;
pub mod error;
pub mod rcon;
pub mod result;
pub mod telnet;
pub mod traits;
pub mod websocket;

pub use connector::NetworkConnector;
pub use error::TransportError;
pub use result::{DEFAULT_TIMEOUT, DialOptions, Reply, Transport};
pub use traits::{Connection, Connector};
