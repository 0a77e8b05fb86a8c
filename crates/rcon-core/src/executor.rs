//! Execution engine: runs commands and prints their responses

use rcon_transport::{Connector, Reply, TransportError};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, instrument, warn};

use crate::color;
use crate::dispatcher::Dispatcher;
use crate::error::CliError;
use crate::logger;
use crate::session::Session;

/// Printed between the responses of consecutive commands in one batch
pub const COMMANDS_RESPONSE_SEPARATOR: &str = "--------";

/// Runs batches of commands against one remote server
#[derive(Debug)]
pub struct Executor<C> {
    pub(crate) dispatcher: Dispatcher<C>,
}

impl<C: Connector> Executor<C> {
    pub fn new(connector: C) -> Self {
        Self {
            dispatcher: Dispatcher::new(connector),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    /// Open the connection if it is not open yet
    ///
    /// # Errors
    /// Returns `CliError::Auth` if dialing fails.
    pub async fn dial(&mut self, session: &Session) -> Result<(), CliError> {
        self.dispatcher.ensure_connected(session).await
    }

    /// Close the connection
    ///
    /// # Errors
    /// Returns the transport's close error.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.dispatcher.close().await
    }

    /// Execute `commands` in order and print each response
    ///
    /// WebSocket RCON connections are closed when the batch ends, whatever
    /// the outcome; other transports stay connected for reuse.
    ///
    /// # Errors
    /// Returns `CliError::CommandEmpty` for an empty list, `CliError::Auth`
    /// if dialing fails and `CliError::Execute` for the first failing command
    /// unless the session skips errors.
    #[instrument(skip_all, fields(address = %session.address, count = commands.len()))]
    pub async fn execute_all<W>(
        &mut self,
        out: &mut W,
        session: &Session,
        commands: &[String],
    ) -> Result<(), CliError>
    where
        W: AsyncWrite + Unpin,
    {
        if commands.is_empty() {
            return Err(CliError::CommandEmpty);
        }

        let result = self.run_batch(out, session, commands).await;

        if !session.transport().keeps_alive() {
            self.dispatcher.close_quietly().await;
        }

        result
    }

    async fn run_batch<W>(
        &mut self,
        out: &mut W,
        session: &Session,
        commands: &[String],
    ) -> Result<(), CliError>
    where
        W: AsyncWrite + Unpin,
    {
        self.dispatcher.ensure_connected(session).await?;

        for (i, command) in commands.iter().enumerate() {
            self.execute(out, session, command).await?;

            if i + 1 != commands.len() {
                write_line(out, COMMANDS_RESPONSE_SEPARATOR).await?;
            }
        }

        Ok(())
    }

    /// Execute a single command over the open connection
    ///
    /// The trimmed, color-normalized response is printed and logged. A
    /// failing command is printed instead of returned when the session skips
    /// errors. Log failures are printed and never returned.
    ///
    /// # Errors
    /// Returns `CliError::CommandEmpty`, `CliError::Execute` when errors are
    /// not skipped, or `CliError::Output` if printing fails.
    pub async fn execute<W>(
        &mut self,
        out: &mut W,
        session: &Session,
        command: &str,
    ) -> Result<(), CliError>
    where
        W: AsyncWrite + Unpin,
    {
        if command.is_empty() {
            return Err(CliError::CommandEmpty);
        }

        let Reply { output, error } = self.dispatcher.execute(command).await;

        let mut response = String::new();
        if !output.is_empty() {
            response = color::normalize(output.trim(), session.strip_colors);
            write_line(out, &response).await?;
        }

        if let Some(e) = error {
            let err = CliError::Execute(e);
            if !session.skip_errors {
                return Err(err);
            }

            warn!(command, error = %err, "command failed, skipping");
            write_line(out, &err.to_string()).await?;
        }

        let logged =
            logger::write(session.log.as_deref(), &session.address, command, &response).await;
        if let Err(e) = logged {
            debug!(error = %e, "log write failed");
            write_line(out, &CliError::Log(e).to_string()).await?;
        }

        Ok(())
    }
}

pub(crate) async fn write_line<W>(out: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}
