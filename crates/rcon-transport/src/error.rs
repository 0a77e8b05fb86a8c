//! Error types for rcon-transport

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while talking to a remote server
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to remote host
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Remote server rejected the credential
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Operation did not finish before its deadline
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// Timeout duration that was exceeded
        timeout: Duration,
    },

    /// Command is empty
    #[error("command is not set")]
    CommandEmpty,

    /// Command exceeds what the protocol can carry
    #[error("command too long: {len} bytes (max {max})")]
    CommandTooLong {
        /// Length of the rejected command
        len: usize,
        /// Maximum accepted length
        max: usize,
    },

    /// Remote answered with something the protocol does not allow
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Remote flagged the command as failed
    #[error("remote error: {0}")]
    Remote(String),

    /// Remote closed the connection
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// WebSocket error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection not established
    #[error("not connected")]
    NotConnected,
}
