//! Core error types for rcon-core

use std::path::PathBuf;

use rcon_transport::TransportError;
use thiserror::Error;

/// Errors that end a batch or an interactive session
///
/// Display strings start with the phase that failed so callers can tell
/// them apart without matching on variants.
#[derive(Error, Debug)]
pub enum CliError {
    /// Batch mode without an address
    #[error("address is not set: to set address add -a host:port")]
    EmptyAddress,

    /// Batch mode without a password
    #[error("password is not set: to set password add -p password")]
    EmptyPassword,

    /// Empty command or command list
    #[error("command is not set")]
    CommandEmpty,

    /// Dial or authentication failed
    #[error("auth: {0}")]
    Auth(#[source] TransportError),

    /// Remote command failed
    #[error("execute: {0}")]
    Execute(#[source] TransportError),

    /// Telnet console session failed
    #[error("telnet: {0}")]
    Telnet(#[source] TransportError),

    /// Command/response log could not be written
    #[error("log: {0}")]
    Log(#[from] LogError),

    /// Configuration file could not be loaded
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    /// Writing to the output stream failed
    #[error("output: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or schema error
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// JSON syntax or schema error
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Extension is neither `.toml` nor `.json`
    #[error("unsupported config file extension: {0}")]
    UnsupportedFormat(PathBuf),

    /// Location of the running executable is unknown
    #[error("cannot locate executable: {0}")]
    Executable(#[source] std::io::Error),
}

/// Errors while appending to the command/response log
#[derive(Error, Debug)]
pub enum LogError {
    /// Parent directory could not be created
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Log file could not be opened or written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
