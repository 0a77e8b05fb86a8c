//! Connection and connector traits

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::error::TransportError;
use crate::result::{DialOptions, Reply, Transport};

/// A live, authenticated session with a remote server
#[async_trait]
pub trait Connection: Send {
    /// Send one command and wait for its response
    async fn execute(&mut self, command: &str) -> Reply;

    /// Close the session
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Factory for connections, one implementation per environment
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and authenticate
    async fn dial(
        &self,
        transport: Transport,
        address: &str,
        password: &str,
        options: DialOptions,
    ) -> Result<Box<dyn Connection>, TransportError>;

    /// Run a self-managed telnet console between `input` and `output`
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
        W: AsyncWrite + Unpin + Send;
}
