//! Dispatcher: owns the single live connection of a run

use rcon_transport::{Connection, Connector, Reply, TransportError};
use tracing::{debug, info, warn};

use crate::error::CliError;
use crate::session::Session;

/// Lazily dials and holds at most one connection
pub struct Dispatcher<C> {
    connector: C,
    connection: Option<Box<dyn Connection>>,
}

impl<C> std::fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("connected", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> Dispatcher<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            connection: None,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Dial the session's transport unless a connection is already open
    ///
    /// A failed dial leaves the dispatcher disconnected so the next call
    /// tries again.
    ///
    /// # Errors
    /// Returns `CliError::Auth` wrapping the transport failure.
    pub async fn ensure_connected(&mut self, session: &Session) -> Result<(), CliError> {
        if self.connection.is_some() {
            return Ok(());
        }

        let transport = session.transport();
        debug!(%transport, address = %session.address, "opening connection");

        let conn = self
            .connector
            .dial(
                transport,
                &session.address,
                &session.password,
                session.dial_options(),
            )
            .await
            .map_err(CliError::Auth)?;

        info!(%transport, address = %session.address, "connected");
        self.connection = Some(conn);
        Ok(())
    }

    /// Send one command over the open connection
    pub async fn execute(&mut self, command: &str) -> Reply {
        match self.connection.as_mut() {
            Some(conn) => conn.execute(command).await,
            None => Reply::failed(TransportError::NotConnected),
        }
    }

    /// Close the connection if one is open
    ///
    /// # Errors
    /// Returns the transport's close error; the handle is dropped either way.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        match self.connection.take() {
            Some(mut conn) => conn.close().await,
            None => Ok(()),
        }
    }

    /// Close and only log a failure
    pub async fn close_quietly(&mut self) {
        if let Err(e) = self.close().await {
            warn!(error = %e, "failed to close connection");
        }
    }
}
