//! Source RCON over TCP
//!
//! Every packet is `size | id | type | body | \0\0` with little-endian `i32`
//! header fields, where `size` counts everything after itself.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument};

use crate::error::TransportError;
use crate::result::{DialOptions, Reply};
use crate::traits::Connection;

/// Longest command the server accepts
pub const MAX_COMMAND_LEN: usize = 1000;

const MIN_PACKET_SIZE: i32 = 10;
const MAX_PACKET_SIZE: i32 = 1 << 20;

const SERVERDATA_AUTH: i32 = 3;
const SERVERDATA_AUTH_RESPONSE: i32 = 2;
const SERVERDATA_EXECCOMMAND: i32 = 2;
const SERVERDATA_RESPONSE_VALUE: i32 = 0;

const AUTH_ID: i32 = 0x2a;
const AUTH_FAILED_ID: i32 = -1;

/// A single RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Packet {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl Packet {
    pub fn new(id: i32, kind: i32, body: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            body: body.into(),
        }
    }

    /// Serialize to wire format
    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let size = i32::try_from(body.len()).unwrap_or(i32::MAX - MIN_PACKET_SIZE)
            + MIN_PACKET_SIZE;

        let mut buf = Vec::with_capacity(body.len() + 14);
        buf.extend_from_slice(&size.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub async fn write_to<W: AsyncWrite + Unpin>(&self, w: &mut W) -> Result<(), TransportError> {
        w.write_all(&self.encode()).await?;
        w.flush().await?;
        Ok(())
    }

    pub async fn read_from<R: AsyncRead + Unpin>(r: &mut R) -> Result<Self, TransportError> {
        let size = r.read_i32_le().await?;
        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&size) {
            return Err(TransportError::InvalidResponse(format!(
                "packet size {size} out of range"
            )));
        }

        let id = r.read_i32_le().await?;
        let kind = r.read_i32_le().await?;

        // size covers id and type (8 bytes) plus the body and its padding
        let mut rest = vec![0u8; (size - 8) as usize];
        r.read_exact(&mut rest).await?;

        let end = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
        let body = String::from_utf8_lossy(&rest[..end]).into_owned();

        Ok(Self { id, kind, body })
    }
}

/// Authenticated Source RCON session
#[derive(Debug)]
pub struct RconConnection {
    stream: TcpStream,
    address: String,
    deadline: Duration,
    next_id: i32,
}

impl RconConnection {
    /// Connect to `address` and authenticate with `password`
    ///
    /// # Errors
    /// Returns `TransportError::AuthenticationFailed` if the server rejects the
    /// password, `TransportError::Timeout` if the dial timeout elapses.
    #[instrument(skip(password, options), fields(transport = "rcon"))]
    pub async fn dial(
        address: &str,
        password: &str,
        options: DialOptions,
    ) -> Result<Self, TransportError> {
        let handshake = async {
            let stream = TcpStream::connect(address)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let mut conn = Self {
                stream,
                address: address.to_string(),
                deadline: options.deadline,
                next_id: AUTH_ID + 1,
            };
            conn.authenticate(password).await?;
            Ok::<_, TransportError>(conn)
        };

        let conn = timeout(options.dial_timeout, handshake)
            .await
            .map_err(|_| TransportError::Timeout {
                timeout: options.dial_timeout,
            })??;

        info!(address = %address, "rcon authenticated");
        Ok(conn)
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), TransportError> {
        Packet::new(AUTH_ID, SERVERDATA_AUTH, password)
            .write_to(&mut self.stream)
            .await?;

        let mut response = Packet::read_from(&mut self.stream).await?;

        // Some servers send an empty RESPONSE_VALUE ahead of the auth result
        if response.kind == SERVERDATA_RESPONSE_VALUE {
            response = Packet::read_from(&mut self.stream).await?;
        }

        if response.kind != SERVERDATA_AUTH_RESPONSE {
            return Err(TransportError::InvalidResponse(format!(
                "unexpected packet type {} during auth",
                response.kind
            )));
        }

        if response.id == AUTH_FAILED_ID {
            return Err(TransportError::AuthenticationFailed(
                "password rejected".to_string(),
            ));
        }

        if response.id != AUTH_ID {
            return Err(TransportError::InvalidResponse(format!(
                "auth response id {} does not match request",
                response.id
            )));
        }

        Ok(())
    }

    async fn round_trip(&mut self, id: i32, command: &str) -> Result<String, TransportError> {
        Packet::new(id, SERVERDATA_EXECCOMMAND, command)
            .write_to(&mut self.stream)
            .await?;

        loop {
            let response = Packet::read_from(&mut self.stream).await?;

            // Late answer to a request that already timed out
            if response.id > AUTH_ID && response.id < id {
                debug!(stale = response.id, id, "dropping stale rcon response");
                continue;
            }

            if response.kind != SERVERDATA_RESPONSE_VALUE {
                return Err(TransportError::InvalidResponse(format!(
                    "unexpected packet type {}",
                    response.kind
                )));
            }

            if response.id != id {
                return Err(TransportError::InvalidResponse(format!(
                    "response id {} does not match request {id}",
                    response.id
                )));
            }

            return Ok(response.body);
        }
    }
}

#[async_trait]
impl Connection for RconConnection {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn execute(&mut self, command: &str) -> Reply {
        if command.is_empty() {
            return Reply::failed(TransportError::CommandEmpty);
        }

        if command.len() > MAX_COMMAND_LEN {
            return Reply::failed(TransportError::CommandTooLong {
                len: command.len(),
                max: MAX_COMMAND_LEN,
            });
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(AUTH_ID + 1);

        debug!(id, "sending rcon command");

        match timeout(self.deadline, self.round_trip(id, command)).await {
            Ok(result) => Reply::from(result),
            Err(_) => Reply::failed(TransportError::Timeout {
                timeout: self.deadline,
            }),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        debug!(address = %self.address, "rcon connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accepts one client, checks the password and echoes commands back
    async fn fake_server(password: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let auth = Packet::read_from(&mut socket).await.unwrap();
            assert_eq!(auth.kind, SERVERDATA_AUTH);

            Packet::new(auth.id, SERVERDATA_RESPONSE_VALUE, "")
                .write_to(&mut socket)
                .await
                .unwrap();

            if auth.body != password {
                Packet::new(AUTH_FAILED_ID, SERVERDATA_AUTH_RESPONSE, "")
                    .write_to(&mut socket)
                    .await
                    .unwrap();
                return;
            }

            Packet::new(auth.id, SERVERDATA_AUTH_RESPONSE, "")
                .write_to(&mut socket)
                .await
                .unwrap();

            while let Ok(request) = Packet::read_from(&mut socket).await {
                let body = format!("echo: {}", request.body);
                Packet::new(request.id, SERVERDATA_RESPONSE_VALUE, body)
                    .write_to(&mut socket)
                    .await
                    .unwrap();
            }
        });

        addr
    }

    #[test]
    fn test_packet_layout() {
        let bytes = Packet::new(7, SERVERDATA_EXECCOMMAND, "list").encode();

        assert_eq!(bytes.len(), 4 + 10 + 4);
        assert_eq!(&bytes[0..4], &14i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &7i32.to_le_bytes());
        assert_eq!(&bytes[12..16], b"list");
        assert_eq!(&bytes[16..], &[0, 0]);
    }

    #[tokio::test]
    async fn test_read_rejects_oversized_packet() {
        let mut bytes: &[u8] = &(MAX_PACKET_SIZE + 1).to_le_bytes();
        let result = Packet::read_from(&mut bytes).await;

        assert!(matches!(result, Err(TransportError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_dial_and_execute() {
        let addr = fake_server("secret").await;
        let mut conn = RconConnection::dial(&addr, "secret", DialOptions::default())
            .await
            .unwrap();

        let reply = conn.execute("players").await;
        assert!(reply.error.is_none());
        assert_eq!(reply.output, "echo: players");

        let reply = conn.execute("status").await;
        assert_eq!(reply.output, "echo: status");

        conn.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let addr = fake_server("secret").await;
        let result = RconConnection::dial(&addr, "nope", DialOptions::default()).await;

        assert!(matches!(result, Err(TransportError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_command_validation() {
        let addr = fake_server("secret").await;
        let mut conn = RconConnection::dial(&addr, "secret", DialOptions::default())
            .await
            .unwrap();

        let reply = conn.execute("").await;
        assert!(matches!(reply.error, Some(TransportError::CommandEmpty)));

        let reply = conn.execute(&"x".repeat(MAX_COMMAND_LEN + 1)).await;
        assert!(matches!(
            reply.error,
            Some(TransportError::CommandTooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_late_reply_is_skipped_after_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let auth = Packet::read_from(&mut socket).await.unwrap();
            Packet::new(auth.id, SERVERDATA_AUTH_RESPONSE, "")
                .write_to(&mut socket)
                .await
                .unwrap();

            let mut first = true;
            while let Ok(request) = Packet::read_from(&mut socket).await {
                if first {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    first = false;
                }
                let body = format!("echo: {}", request.body);
                let _ = Packet::new(request.id, SERVERDATA_RESPONSE_VALUE, body)
                    .write_to(&mut socket)
                    .await;
            }
        });

        let options = DialOptions::uniform(Duration::from_millis(200));
        let mut conn = RconConnection::dial(&addr, "secret", options).await.unwrap();

        let reply = conn.execute("slow").await;
        assert!(matches!(reply.error, Some(TransportError::Timeout { .. })));

        let reply = conn.execute("second").await;
        assert!(reply.error.is_none(), "{:?}", reply.error);
        assert_eq!(reply.output, "echo: second");

        let reply = conn.execute("third").await;
        assert!(reply.error.is_none(), "{:?}", reply.error);
        assert_eq!(reply.output, "echo: third");
    }

    #[tokio::test]
    async fn test_dial_timeout() {
        // Accepts the socket but never answers the auth packet
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let options = DialOptions::uniform(Duration::from_millis(100));
        let result = RconConnection::dial(&addr, "secret", options).await;

        assert!(matches!(result, Err(TransportError::Timeout { .. })));
    }
}
