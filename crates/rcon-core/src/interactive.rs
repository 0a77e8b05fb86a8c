//! Interactive mode: prompt for missing credentials, then read commands
//! line by line until the quit token

use rcon_transport::{Connector, Transport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::error::CliError;
use crate::executor::Executor;
use crate::session::{Protocol, Session};

/// Input line that ends interactive mode
pub const COMMAND_QUIT: &str = rcon_transport::telnet::QUIT_TOKEN;

/// Shown before each command is read
pub const PROMPT: &str = "> ";

/// Steps of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    PromptAddress,
    PromptPassword,
    PromptProtocol,
    Connecting,
    AwaitingCommand,
    Terminated,
}

impl State {
    /// First state for `session`; prompts for fields already set are skipped
    #[must_use]
    pub fn initial(session: &Session) -> Self {
        State::PromptAddress.skip_filled(session)
    }

    /// State after the current prompt has been answered
    #[must_use]
    pub fn next(self, session: &Session) -> Self {
        match self {
            State::PromptAddress => State::PromptPassword.skip_filled(session),
            State::PromptPassword => State::PromptProtocol.skip_filled(session),
            State::PromptProtocol => State::Connecting,
            other => other,
        }
    }

    fn skip_filled(self, session: &Session) -> Self {
        match self {
            State::PromptAddress if !session.address.is_empty() => {
                State::PromptPassword.skip_filled(session)
            }
            State::PromptPassword if !session.password.is_empty() => {
                State::PromptProtocol.skip_filled(session)
            }
            State::PromptProtocol if session.protocol.is_some() => State::Connecting,
            other => other,
        }
    }
}

impl<C: Connector> Executor<C> {
    /// Run interactive mode over `input` and `output`
    ///
    /// Missing session fields are prompted for first. Telnet sessions are
    /// handed to the telnet console loop; unsupported protocols print a
    /// diagnostic and return. Otherwise every non-empty line is executed as
    /// a single command until the quit token or the end of input.
    ///
    /// # Errors
    /// Returns dial errors and the first command failure that is not skipped.
    pub async fn interactive<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
        session: &mut Session,
    ) -> Result<(), CliError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        let mut state = State::initial(session);

        loop {
            debug!(?state, "interactive step");

            state = match state {
                State::PromptAddress => {
                    prompt(output, "Enter remote host and port [ip:port]: ").await?;
                    session.address = read_token(input).await?;
                    state.next(session)
                }
                State::PromptPassword => {
                    prompt(output, "Enter password: ").await?;
                    session.password = read_token(input).await?;
                    state.next(session)
                }
                State::PromptProtocol => {
                    prompt(output, "Enter protocol type (empty for rcon): ").await?;
                    session.protocol = Protocol::parse(&read_token(input).await?);
                    state.next(session)
                }
                State::Connecting => self.connect(input, output, session).await?,
                State::AwaitingCommand => {
                    let mut line = String::new();
                    if input.read_line(&mut line).await? == 0 {
                        debug!("end of input");
                        State::Terminated
                    } else {
                        let command = line.trim_end_matches(['\r', '\n']);
                        if command == COMMAND_QUIT {
                            State::Terminated
                        } else {
                            if !command.is_empty() {
                                let batch = [command.to_string()];
                                self.execute_all(output, session, &batch).await?;
                            }
                            prompt(output, PROMPT).await?;
                            State::AwaitingCommand
                        }
                    }
                }
                State::Terminated => return Ok(()),
            };
        }
    }

    async fn connect<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
        session: &Session,
    ) -> Result<State, CliError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        match &session.protocol {
            Some(Protocol::Telnet) => {
                info!(address = %session.address, "handing over to telnet console");
                self.dispatcher
                    .connector()
                    .interactive(
                        input,
                        output,
                        &session.address,
                        &session.password,
                        session.dial_options(),
                    )
                    .await
                    .map_err(CliError::Telnet)?;
                Ok(State::Terminated)
            }
            Some(Protocol::Unknown(name)) => {
                let diagnostic = format!(
                    "Unsupported protocol type ({name:?}). Allowed {:?}, {:?} and {:?} protocols\n",
                    Transport::Rcon.as_str(),
                    Transport::WebRcon.as_str(),
                    Transport::Telnet.as_str(),
                );
                prompt(output, &diagnostic).await?;
                Ok(State::Terminated)
            }
            None | Some(Protocol::Rcon | Protocol::WebRcon) => {
                self.dial(session).await?;

                let banner = format!(
                    "Waiting commands for {} (or type {COMMAND_QUIT} to exit)\n{PROMPT}",
                    session.address
                );
                prompt(output, &banner).await?;
                Ok(State::AwaitingCommand)
            }
        }
    }
}

/// Write without a trailing newline
async fn prompt<W>(output: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}

/// Read one line and return its first whitespace-separated token
async fn read_token<R>(input: &mut R) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(line.split_whitespace().next().unwrap_or_default().to_string())
}
