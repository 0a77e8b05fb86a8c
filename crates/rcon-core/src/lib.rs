//! rcon-core: Session handling and command execution
//!
//! Resolves the session descriptor, owns the single remote connection,
//! runs batches of commands and drives interactive mode.

pub mod color;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod interactive;
pub mod logger;
pub mod session;

pub use config::{Config, DEFAULT_CONFIG_ENV, DEFAULT_CONFIG_NAME};
pub use dispatcher::Dispatcher;
pub use error::{CliError, ConfigError, LogError};
pub use executor::{COMMANDS_RESPONSE_SEPARATOR, Executor};
pub use interactive::{COMMAND_QUIT, PROMPT, State};
pub use session::{DEFAULT_TIMEOUT, Protocol, Session, SessionFields, SessionOptions, merge};
