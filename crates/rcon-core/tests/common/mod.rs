//! Scripted connector shared by the integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncWrite};

use rcon_core::{Protocol, Session, SessionFields, SessionOptions};
use rcon_transport::{Connection, Connector, DialOptions, Reply, Transport, TransportError};

/// Everything the mock saw
#[derive(Debug, Default)]
pub struct Recorded {
    pub dials: Vec<Transport>,
    pub closes: usize,
    pub executed: Vec<String>,
    pub telnet_sessions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    pub recorded: Arc<Mutex<Recorded>>,
    /// Commands answered with partial output and an error
    pub failing: Vec<&'static str>,
    /// Commands answered with an empty response
    pub silent: Vec<&'static str>,
    pub fail_dial: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, command: &'static str) -> Self {
        self.failing.push(command);
        self
    }

    pub fn silent(mut self, command: &'static str) -> Self {
        self.silent.push(command);
        self
    }

    pub fn refusing(mut self) -> Self {
        self.fail_dial = true;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.recorded.lock().unwrap().executed.clone()
    }

    pub fn dials(&self) -> usize {
        self.recorded.lock().unwrap().dials.len()
    }

    pub fn closes(&self) -> usize {
        self.recorded.lock().unwrap().closes
    }

    pub fn telnet_sessions(&self) -> usize {
        self.recorded.lock().unwrap().telnet_sessions
    }
}

struct MockConnection {
    recorded: Arc<Mutex<Recorded>>,
    failing: Vec<&'static str>,
    silent: Vec<&'static str>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, command: &str) -> Reply {
        self.recorded
            .lock()
            .unwrap()
            .executed
            .push(command.to_string());

        if self.failing.iter().any(|f| *f == command) {
            return Reply::partial(
                format!("partial {command}"),
                TransportError::Remote("boom".to_string()),
            );
        }

        if self.silent.iter().any(|s| *s == command) {
            return Reply::ok("");
        }

        Reply::ok(format!("  §aok {command}  \n"))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.recorded.lock().unwrap().closes += 1;
        Ok(())
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn dial(
        &self,
        transport: Transport,
        _address: &str,
        _password: &str,
        _options: DialOptions,
    ) -> Result<Box<dyn Connection>, TransportError> {
        self.recorded.lock().unwrap().dials.push(transport);

        if self.fail_dial {
            return Err(TransportError::AuthenticationFailed(
                "password rejected".to_string(),
            ));
        }

        Ok(Box::new(MockConnection {
            recorded: Arc::clone(&self.recorded),
            failing: self.failing.clone(),
            silent: self.silent.clone(),
        }))
    }

    async fn interactive<R, W>(
        &self,
        _input: &mut R,
        _output: &mut W,
        _address: &str,
        _password: &str,
        _options: DialOptions,
    ) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send,
    {
        self.recorded.lock().unwrap().telnet_sessions += 1;
        Ok(())
    }
}

/// Session with credentials set and colors stripped
pub fn session(protocol: Option<Protocol>) -> Session {
    let fields = SessionFields {
        address: Some("127.0.0.1:16260".to_string()),
        password: Some("pw".to_string()),
        ..SessionFields::default()
    };
    let options = SessionOptions {
        strip_colors: true,
        ..SessionOptions::default()
    };

    let mut session = Session::new(fields, options);
    session.protocol = protocol;
    session
}

pub fn commands(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}
