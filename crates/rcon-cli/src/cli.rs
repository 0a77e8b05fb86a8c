//! Command-line arguments and session resolution

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use rcon_core::config::{self, Config};
use rcon_core::{
    ConfigError, DEFAULT_CONFIG_ENV, DEFAULT_TIMEOUT, Session, SessionFields, SessionOptions,
    merge,
};
use tracing::debug;

const LONG_ABOUT: &str = "\
Can be run in two modes - in the mode of a single query and in terminal mode of reading the input stream.

To run single mode type commands after options flags. Example:
    rcon -a 127.0.0.1:16260 -p password command1 command2

To run terminal mode just do not specify commands to execute. Example:
    rcon -a 127.0.0.1:16260 -p password";

#[derive(Parser, Debug)]
#[command(name = "rcon", version, disable_version_flag = true)]
#[command(about = "CLI for executing queries on a remote server", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Set host and port to remote server. Example 127.0.0.1:16260
    #[arg(short, long)]
    pub address: Option<String>,

    /// Set password to remote server
    #[arg(short, long)]
    pub password: Option<String>,

    /// Specify type of connection (rcon, web, telnet)
    #[arg(short = 't', long = "type")]
    pub protocol: Option<String>,

    /// Path to the log file. If not specified it is taken from the config
    #[arg(short, long)]
    pub log: Option<String>,

    /// Path to the configuration file [default: rcon.toml next to the executable]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Config environment with server credentials
    #[arg(short, long, default_value = DEFAULT_CONFIG_ENV)]
    pub env: String,

    /// Skip errors and run next command
    #[arg(short, long)]
    pub skip: bool,

    /// Set dial and execute timeout, e.g. 500ms or 30s
    #[arg(short = 'T', long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Print stored variables and exit
    #[arg(short = 'V', long)]
    pub variables: bool,

    /// Remove color codes from responses instead of rendering them
    #[arg(long)]
    pub strip_colors: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Commands to execute; interactive mode when none are given
    pub commands: Vec<String>,
}

impl Cli {
    fn flag_fields(&self) -> SessionFields {
        SessionFields {
            address: self.address.clone(),
            password: self.password.clone(),
            log: self.log.clone(),
            protocol: self.protocol.clone(),
        }
    }

    fn options(&self) -> SessionOptions {
        SessionOptions {
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            skip_errors: self.skip,
            strip_colors: self.strip_colors,
            variables: self.variables,
        }
    }

    /// Build the session: flags first, then the config environment
    ///
    /// The config file is not read when address and password are both given
    /// as flags.
    ///
    /// # Errors
    /// Returns `ConfigError` if the config file cannot be loaded.
    pub fn session(&self) -> Result<Session, ConfigError> {
        let flags = self.flag_fields();

        if flags.has_credentials() {
            debug!("credentials given as flags, config file ignored");
            return Ok(Session::new(flags, self.options()));
        }

        let config = Config::load_or_default(self.config.as_deref())?;
        let env = config.environment(&self.env);
        let fields = merge(flags, env, SessionFields::default());

        Ok(Session::new(fields, self.options()))
    }

    /// Config path shown by `--variables`
    #[must_use]
    pub fn config_path(&self) -> String {
        self.config
            .clone()
            .or_else(|| config::default_path().ok())
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}
