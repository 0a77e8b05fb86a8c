//! Value types shared by every transport

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::TransportError;

/// Protocol family used to reach a remote server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Source RCON over TCP
    Rcon,
    /// JSON RCON over WebSocket
    WebRcon,
    /// Line-based telnet console
    Telnet,
}

impl Transport {
    /// Identifier accepted on the command line and in config files
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Rcon => "rcon",
            Transport::WebRcon => "web",
            Transport::Telnet => "telnet",
        }
    }

    /// Whether the transport can keep a connection open between batches
    #[must_use]
    pub fn keeps_alive(&self) -> bool {
        !matches!(self, Transport::WebRcon)
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rcon" => Ok(Transport::Rcon),
            "web" => Ok(Transport::WebRcon),
            "telnet" => Ok(Transport::Telnet),
            other => Err(other.to_string()),
        }
    }
}

/// Dial and command timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeouts applied by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialOptions {
    /// Upper bound for connecting and authenticating
    pub dial_timeout: Duration,
    /// Upper bound for each command round trip
    pub deadline: Duration,
}

impl DialOptions {
    /// Use the same duration for dialing and for every command
    #[must_use]
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            dial_timeout: timeout,
            deadline: timeout,
        }
    }
}

impl Default for DialOptions {
    fn default() -> Self {
        Self::uniform(DEFAULT_TIMEOUT)
    }
}

/// What came back from the remote for a single command
///
/// A server may answer with text and flag a failure at the same time, so the
/// output and the error are carried side by side instead of in a `Result`.
#[derive(Debug, Default)]
pub struct Reply {
    /// Raw response text, possibly empty
    pub output: String,
    /// Failure reported for this command, if any
    pub error: Option<TransportError>,
}

impl Reply {
    /// Successful response
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
        }
    }

    /// Failed command without any output
    #[must_use]
    pub fn failed(error: TransportError) -> Self {
        Self {
            output: String::new(),
            error: Some(error),
        }
    }

    /// Output that arrived together with an error
    pub fn partial(output: impl Into<String>, error: TransportError) -> Self {
        Self {
            output: output.into(),
            error: Some(error),
        }
    }
}

impl From<Result<String, TransportError>> for Reply {
    fn from(result: Result<String, TransportError>) -> Self {
        match result {
            Ok(output) => Reply::ok(output),
            Err(e) => Reply::failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_identifiers() {
        assert_eq!("rcon".parse::<Transport>(), Ok(Transport::Rcon));
        assert_eq!("web".parse::<Transport>(), Ok(Transport::WebRcon));
        assert_eq!("telnet".parse::<Transport>(), Ok(Transport::Telnet));
        assert_eq!("RCON".parse::<Transport>(), Err("RCON".to_string()));
        assert_eq!(Transport::WebRcon.to_string(), "web");
    }

    #[test]
    fn test_only_websocket_drops_connection() {
        assert!(Transport::Rcon.keeps_alive());
        assert!(Transport::Telnet.keeps_alive());
        assert!(!Transport::WebRcon.keeps_alive());
    }

    #[test]
    fn test_reply_from_result() {
        let reply = Reply::from(Ok::<_, TransportError>("pong".to_string()));
        assert!(reply.error.is_none());
        assert_eq!(reply.output, "pong");

        let reply = Reply::from(Err::<String, _>(TransportError::NotConnected));
        assert!(reply.error.is_some());
        assert!(reply.output.is_empty());
    }
}
