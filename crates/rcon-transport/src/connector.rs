//! Network-backed connector

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::debug;

use crate::error::TransportError;
use crate::rcon::RconConnection;
use crate::result::{DialOptions, Transport};
use crate::telnet::{self, TelnetConnection};
use crate::traits::{Connection, Connector};
use crate::websocket::WebRconConnection;

/// Connector that opens real TCP and WebSocket connections
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkConnector;

impl NetworkConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn dial(
        &self,
        transport: Transport,
        address: &str,
        password: &str,
        options: DialOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        debug!(%transport, %address, "dialing");

        let conn: Box<dyn Connection> = match transport {
            Transport::Rcon => Box::new(RconConnection::dial(address, password, options).await?),
            Transport::WebRcon => {
                Box::new(WebRconConnection::dial(address, password, options).await?)
            }
            Transport::Telnet => {
                Box::new(TelnetConnection::dial(address, password, options).await?)
            }
        };

        Ok(conn)
    }

    async fn interactive<R, W>(
        &self,
        input: &mut R,
        output: &mut W,
        address: &str,
        password: &str,
        options: DialOptions,
    ) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        telnet::interactive(input, output, address, password, options).await
    }
}
