//! Line-based telnet console with a password prompt

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::TransportError;
use crate::result::{DialOptions, Reply};
use crate::traits::Connection;

const PASSWORD_PROMPT: &str = "Please enter password:";
const LOGON_SUCCESS: &str = "Logon successful.";
const LOGON_FAILED: &str = "Password incorrect";

/// Command that ends the remote console session
const EXIT_COMMAND: &str = "exit";

/// Local token that ends an interactive telnet session
pub const QUIT_TOKEN: &str = ":q";

/// Silence after which a command's output is considered complete
const QUIET_PERIOD: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 4096;

/// Authenticated telnet console session
#[derive(Debug)]
pub struct TelnetConnection {
    stream: TcpStream,
    address: String,
    deadline: Duration,
}

impl TelnetConnection {
    /// Connect, answer the password prompt and wait for the logon result
    ///
    /// # Errors
    /// Returns `TransportError::AuthenticationFailed` if the console reports a
    /// wrong password, `TransportError::Timeout` if the dial timeout elapses.
    #[instrument(skip(password, options), fields(transport = "telnet"))]
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
            };
            conn.authenticate(password).await?;
            Ok::<_, TransportError>(conn)
        };

        let conn = timeout(options.dial_timeout, handshake)
            .await
            .map_err(|_| TransportError::Timeout {
                timeout: options.dial_timeout,
            })??;

        info!(address = %address, "telnet authenticated");
        Ok(conn)
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), TransportError> {
        self.read_until_any(&[PASSWORD_PROMPT]).await?;
        self.send_line(password).await?;

        match self.read_until_any(&[LOGON_SUCCESS, LOGON_FAILED]).await? {
            0 => Ok(()),
            _ => Err(TransportError::AuthenticationFailed(
                "password rejected".to_string(),
            )),
        }
    }

    /// Read until one of `markers` shows up and return its index
    async fn read_until_any(&mut self, markers: &[&str]) -> Result<usize, TransportError> {
        let mut seen = String::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(TransportError::ConnectionClosed(
                    "console closed during logon".into(),
                ));
            }

            seen.push_str(&String::from_utf8_lossy(&buf[..n]));

            if let Some(idx) = markers.iter().position(|m| seen.contains(m)) {
                return Ok(idx);
            }
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.stream.write_all(format!("{line}\r\n").as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Collect output until the console goes quiet or the deadline passes
    async fn collect_output(&mut self) -> Reply {
        let started = Instant::now();
        let mut output = String::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if started.elapsed() >= self.deadline {
                if output.is_empty() {
                    return Reply::failed(TransportError::Timeout {
                        timeout: self.deadline,
                    });
                }
                return Reply::ok(output);
            }

            match timeout(QUIET_PERIOD, self.stream.read(&mut buf)).await {
                Ok(Ok(0)) => {
                    let closed = TransportError::ConnectionClosed("console closed".into());
                    return Reply::partial(output, closed);
                }
                Ok(Ok(n)) => output.push_str(&String::from_utf8_lossy(&buf[..n])),
                Ok(Err(e)) => return Reply::partial(output, TransportError::Io(e)),
                Err(_) if !output.is_empty() => return Reply::ok(output),
                Err(_) => {}
            }
        }
    }
}

#[async_trait]
impl Connection for TelnetConnection {
    #[instrument(skip(self), fields(address = %self.address))]
    async fn execute(&mut self, command: &str) -> Reply {
        if command.is_empty() {
            return Reply::failed(TransportError::CommandEmpty);
        }

        if let Err(e) = self.send_line(command).await {
            return Reply::failed(e);
        }

        self.collect_output().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.send_line(EXIT_COMMAND).await?;
        self.stream.shutdown().await?;
        debug!(address = %self.address, "telnet connection closed");
        Ok(())
    }
}

/// Bridge `input` and `output` to a remote console until either side ends
///
/// Remote output is copied as it arrives. Each input line is forwarded; the
/// quit token or the end of input sends `exit` and returns.
///
/// # Errors
/// Returns dial errors and I/O errors on either stream.
#[instrument(skip(input, output, password, options))]
pub async fn interactive<R, W>(
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
    let mut conn = TelnetConnection::dial(address, password, options).await?;

    output
        .write_all(format!("Connected to {address} (type {QUIT_TOKEN} to exit)\n").as_bytes())
        .await?;
    output.flush().await?;

    let mut lines = input.lines();
    let (mut remote_rx, mut remote_tx) = conn.stream.split();
    let mut buf = [0u8; READ_CHUNK];

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim() == QUIT_TOKEN => break,
                    Some(line) => {
                        remote_tx.write_all(format!("{line}\r\n").as_bytes()).await?;
                        remote_tx.flush().await?;
                    }
                    None => break,
                }
            }
            read = remote_rx.read(&mut buf) => {
                match read? {
                    0 => {
                        debug!("console closed the session");
                        return Ok(());
                    }
                    n => {
                        output.write_all(&buf[..n]).await?;
                        output.flush().await?;
                    }
                }
            }
        }
    }

    if let Err(e) = conn.close().await {
        warn!(error = %e, "failed to close telnet session");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Console that answers each line and reports every line it received
    async fn fake_console(password: &'static str) -> (String, oneshot::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = socket.into_split();
            let mut lines = BufReader::new(read_half).lines();
            let mut received = Vec::new();

            write_half
                .write_all(b"*** Connected with 7DTD server.\r\nPlease enter password:\r\n")
                .await
                .unwrap();

            let attempt = lines.next_line().await.unwrap().unwrap_or_default();
            if attempt.trim() != password {
                write_half
                    .write_all(b"Password incorrect, please enter password:\r\n")
                    .await
                    .unwrap();
                let _ = tx.send(received);
                return;
            }
            write_half.write_all(b"Logon successful.\r\n").await.unwrap();

            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                received.push(line.clone());
                if line == EXIT_COMMAND {
                    break;
                }
                let answer = format!("*** result of {line}\r\n");
                let _ = write_half.write_all(answer.as_bytes()).await;
            }

            let _ = tx.send(received);
        });

        (addr, rx)
    }

    #[tokio::test]
    async fn test_dial_and_execute() {
        let (addr, received) = fake_console("secret").await;
        let mut conn = TelnetConnection::dial(&addr, "secret", DialOptions::default())
            .await
            .unwrap();

        let reply = conn.execute("version").await;
        assert!(reply.error.is_none());
        assert_eq!(reply.output.trim(), "*** result of version");

        conn.close().await.unwrap();
        assert_eq!(received.await.unwrap(), vec!["version", "exit"]);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let (addr, _received) = fake_console("secret").await;
        let result = TelnetConnection::dial(&addr, "nope", DialOptions::default()).await;

        assert!(matches!(result, Err(TransportError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_interactive_forwards_lines_until_quit() {
        let (addr, received) = fake_console("secret").await;
        let mut input: &[u8] = b"version\n:q\nnever sent\n";
        let mut output = Vec::new();

        interactive(&mut input, &mut output, &addr, "secret", DialOptions::default())
            .await
            .unwrap();

        assert_eq!(received.await.unwrap(), vec!["version", "exit"]);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("Connected to"));
    }
}
