//! Session descriptor: resolved connection parameters for one run

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

pub use rcon_transport::DEFAULT_TIMEOUT;
use rcon_transport::{DialOptions, Transport};
use serde::Deserialize;

use crate::error::CliError;

/// Protocol requested for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    Rcon,
    WebRcon,
    Telnet,
    /// Anything else; dials as RCON, rejected by interactive mode
    Unknown(String),
}

impl Protocol {
    /// Parse a protocol identifier; the empty string means "not chosen"
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        Some(match s.parse::<Transport>() {
            Ok(Transport::Rcon) => Protocol::Rcon,
            Ok(Transport::WebRcon) => Protocol::WebRcon,
            Ok(Transport::Telnet) => Protocol::Telnet,
            Err(other) => Protocol::Unknown(other),
        })
    }

    /// Transport used to dial; unknown identifiers fall back to RCON
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self {
            Protocol::WebRcon => Transport::WebRcon,
            Protocol::Telnet => Transport::Telnet,
            Protocol::Rcon | Protocol::Unknown(_) => Transport::Rcon,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Rcon => Transport::Rcon.as_str(),
            Protocol::WebRcon => Transport::WebRcon.as_str(),
            Protocol::Telnet => Transport::Telnet.as_str(),
            Protocol::Unknown(s) => s,
        }
    }
}

/// Connection fields that may come from flags, a config environment or
/// built-in defaults. Unset and empty values are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionFields {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default, rename = "type")]
    pub protocol: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl SessionFields {
    /// Keep set fields and take the rest from `fallback`
    #[must_use]
    pub fn or(self, fallback: SessionFields) -> SessionFields {
        SessionFields {
            address: non_empty(self.address).or(non_empty(fallback.address)),
            password: non_empty(self.password).or(non_empty(fallback.password)),
            log: non_empty(self.log).or(non_empty(fallback.log)),
            protocol: non_empty(self.protocol).or(non_empty(fallback.protocol)),
        }
    }

    /// Whether both credentials are present, making a config file unnecessary
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.address.as_deref().is_some_and(|v| !v.is_empty())
            && self.password.as_deref().is_some_and(|v| !v.is_empty())
    }
}

/// Merge in priority order: explicit flag, config environment, default
#[must_use]
pub fn merge(
    flags: SessionFields,
    config: SessionFields,
    defaults: SessionFields,
) -> SessionFields {
    flags.or(config).or(defaults)
}

/// Options that only come from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub skip_errors: bool,
    pub strip_colors: bool,
    pub variables: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            skip_errors: false,
            strip_colors: false,
            variables: false,
        }
    }
}

/// Resolved parameters for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub address: String,
    pub password: String,
    /// `None` until chosen; dials as RCON
    pub protocol: Option<Protocol>,
    /// Command/response log; `None` disables logging
    pub log: Option<PathBuf>,
    /// Applies to dialing and to every command
    pub timeout: Duration,
    pub skip_errors: bool,
    pub strip_colors: bool,
    /// Print the resolved session and exit
    pub variables: bool,
}

impl Session {
    #[must_use]
    pub fn new(fields: SessionFields, options: SessionOptions) -> Self {
        Self {
            address: fields.address.unwrap_or_default(),
            password: fields.password.unwrap_or_default(),
            protocol: fields.protocol.as_deref().and_then(Protocol::parse),
            log: non_empty(fields.log).map(PathBuf::from),
            timeout: options.timeout,
            skip_errors: options.skip_errors,
            strip_colors: options.strip_colors,
            variables: options.variables,
        }
    }

    /// Transport to dial for this session
    #[must_use]
    pub fn transport(&self) -> Transport {
        self.protocol
            .as_ref()
            .map_or(Transport::Rcon, Protocol::transport)
    }

    #[must_use]
    pub fn dial_options(&self) -> DialOptions {
        DialOptions::uniform(self.timeout)
    }

    /// Batch mode needs both credentials up front
    ///
    /// # Errors
    /// Returns `CliError::EmptyAddress` or `CliError::EmptyPassword`.
    pub fn validate_for_batch(&self) -> Result<(), CliError> {
        if self.address.is_empty() {
            return Err(CliError::EmptyAddress);
        }

        if self.password.is_empty() {
            return Err(CliError::EmptyPassword);
        }

        Ok(())
    }

    /// Human-readable dump of every field
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let log = self
            .log
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let protocol = self.protocol.as_ref().map_or("", Protocol::as_str);

        let _ = writeln!(out, "Address: {}", self.address);
        let _ = writeln!(out, "Password: {}", self.password);
        let _ = writeln!(out, "Log: {log}");
        let _ = writeln!(out, "Type: {protocol}");
        let _ = writeln!(out, "SkipErrors: {}", self.skip_errors);
        let _ = writeln!(out, "StripColors: {}", self.strip_colors);
        let _ = writeln!(out, "Timeout: {:?}", self.timeout);
        out
    }
}
