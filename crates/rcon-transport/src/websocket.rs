//! JSON RCON over WebSocket
//!
//! The password travels in the URL path; each command is a JSON request
//! tagged with an identifier the server echoes back in its answer.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::TransportError;
use crate::result::{DialOptions, Reply};
use crate::traits::Connection;

const CLIENT_NAME: &str = "WebRcon";
const ERROR_TYPE: &str = "Error";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Request<'a> {
    identifier: i32,
    message: &'a str,
    name: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Response {
    #[serde(default)]
    message: String,
    #[serde(default)]
    identifier: i32,
    #[serde(default, rename = "Type")]
    kind: String,
    #[serde(default)]
    stacktrace: String,
}

/// Build `ws://address/password`
fn endpoint(address: &str, password: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(&format!("ws://{address}"))
        .map_err(|e| TransportError::ConnectionFailed(format!("invalid address {address}: {e}")))?;

    url.path_segments_mut()
        .map_err(|()| TransportError::ConnectionFailed(format!("invalid address {address}")))?
        .clear()
        .push(password);

    Ok(url)
}

/// WebSocket RCON session
pub struct WebRconConnection {
    stream: WsStream,
    address: String,
    deadline: Duration,
    next_id: i32,
}

impl std::fmt::Debug for WebRconConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebRconConnection")
            .field("address", &self.address)
            .field("deadline", &self.deadline)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl WebRconConnection {
    /// Open the WebSocket; a rejected handshake means a bad password
    ///
    /// # Errors
    /// Returns `TransportError::AuthenticationFailed` on HTTP 401/403,
    /// `TransportError::Timeout` if the dial timeout elapses.
    #[instrument(skip(password, options), fields(transport = "web"))]
    pub async fn dial(
        address: &str,
        password: &str,
        options: DialOptions,
    ) -> Result<Self, TransportError> {
        let url = endpoint(address, password)?;

        let (stream, _) = timeout(options.dial_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| TransportError::Timeout {
                timeout: options.dial_timeout,
            })?
            .map_err(|e| match e {
                WsError::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
                    TransportError::AuthenticationFailed(format!(
                        "handshake rejected with {}",
                        response.status()
                    ))
                }
                WsError::Io(e) => TransportError::ConnectionFailed(e.to_string()),
                other => TransportError::WebSocket(other.to_string()),
            })?;

        info!(address = %address, "websocket rcon connected");

        Ok(Self {
            stream,
            address: address.to_string(),
            deadline: options.deadline,
            next_id: 1,
        })
    }

    async fn round_trip(&mut self, id: i32, command: &str) -> Result<Response, TransportError> {
        let request = serde_json::to_string(&Request {
            identifier: id,
            message: command,
            name: CLIENT_NAME,
        })?;

        self.stream
            .send(Message::text(request))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;

        loop {
            let msg = self
                .stream
                .next()
                .await
                .ok_or_else(|| TransportError::ConnectionClosed("stream ended".into()))?
                .map_err(|e| TransportError::WebSocket(e.to_string()))?;

            match msg {
                Message::Text(text) => {
                    let response: Response = serde_json::from_str(&text)?;
                    if response.identifier == id {
                        return Ok(response);
                    }

                    // Console broadcasts share the socket with command answers
                    debug!(identifier = response.identifier, "skipping unrelated message");
                }
                Message::Close(_) => {
                    return Err(TransportError::ConnectionClosed(
                        "server closed connection".into(),
                    ));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_) => {}
            }
        }
    }
}

#[async_trait]
impl Connection for WebRconConnection {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn execute(&mut self, command: &str) -> Reply {
        if command.is_empty() {
            return Reply::failed(TransportError::CommandEmpty);
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);

        match timeout(self.deadline, self.round_trip(id, command)).await {
            Ok(Ok(response)) if response.kind == ERROR_TYPE => {
                let reason = if response.stacktrace.is_empty() {
                    response.message.clone()
                } else {
                    response.stacktrace
                };
                Reply::partial(response.message, TransportError::Remote(reason))
            }
            Ok(Ok(response)) => Reply::ok(response.message),
            Ok(Err(e)) => Reply::failed(e),
            Err(_) => Reply::failed(TransportError::Timeout {
                timeout: self.deadline,
            }),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        debug!(address = %self.address, "websocket rcon closed");
        Ok(())
    }
}
