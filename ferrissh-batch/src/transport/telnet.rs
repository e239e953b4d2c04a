//! Telnet transport over a tokio TCP stream.
//!
//! Only as much of the protocol as a vendor CLI login needs: option
//! requests are refused except the server-side echo and suppress-go-ahead
//! options, subnegotiations are dropped, and everything else is passed to
//! the [`PatternBuffer`] as shell output.

use std::time::Duration;

use log::debug;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::config::TelnetConfig;
use super::{ReadResult, Shell};
use crate::channel::PatternBuffer;
use crate::error::{ChannelError, SessionError, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SUPPRESS_GO_AHEAD: u8 = 3;

const USERNAME_PROMPT: &str = r"(?i)(?:user\s?name|login)\s*:\s*$";
const PASSWORD_PROMPT: &str = r"(?i)password\s*:\s*$";

/// Telnet transport wrapping a TCP stream.
pub struct TelnetTransport {
    stream: TcpStream,

    /// Strips protocol commands from the byte stream.
    decoder: TelnetDecoder,

    /// Output accumulated since the last match.
    buffer: PatternBuffer,

    host: String,
    closed: bool,
}

impl TelnetTransport {
    /// Connect and log in. Returns once the device shows its prompt.
    pub async fn connect(config: TelnetConfig) -> Result<Self, SessionError> {
        debug!("telnet to {}:{}", config.host, config.port);

        let stream = tokio::time::timeout(
            config.timeout,
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|source| TransportError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        })?;

        let mut transport = Self {
            stream,
            decoder: TelnetDecoder::default(),
            buffer: PatternBuffer::new(config.search_depth),
            host: config.host.clone(),
            closed: false,
        };
        transport.login(&config).await?;
        Ok(transport)
    }

    /// Answer the username and password prompts.
    ///
    /// The device prompt is left in the buffer for the session to read.
    /// Seeing a login prompt a second time means the credentials were
    /// rejected.
    async fn login(&mut self, config: &TelnetConfig) -> Result<(), SessionError> {
        let username_prompt = Regex::new(USERNAME_PROMPT).map_err(ChannelError::from)?;
        let password_prompt = Regex::new(PASSWORD_PROMPT).map_err(ChannelError::from)?;
        let patterns = [&username_prompt, &password_prompt, &config.prompt_pattern];

        let mut username_sent = false;
        let mut password_sent = false;

        loop {
            match self.fill_until(&patterns, config.timeout).await? {
                0 if !username_sent => {
                    self.buffer.take();
                    self.send(&config.username).await?;
                    username_sent = true;
                }
                1 if !password_sent => {
                    self.buffer.take();
                    self.send_secret(&config.password).await?;
                    password_sent = true;
                }
                0 | 1 => {
                    return Err(TransportError::AuthenticationFailed {
                        user: config.username.clone(),
                    }
                    .into());
                }
                _ => return Ok(()),
            }
        }
    }

    /// Read until one of `patterns` matches the tail of the buffer and
    /// return its index. The buffer is not consumed.
    async fn fill_until(&mut self, patterns: &[&Regex], timeout: Duration) -> Result<usize, SessionError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; 4096];

        loop {
            if let Some(index) = patterns.iter().position(|p| self.buffer.tail_contains(p)) {
                return Ok(index);
            }

            let n = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk))
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?
                .map_err(ChannelError::Io)?;
            if n == 0 {
                self.closed = true;
                return Err(ChannelError::Closed.into());
            }

            let mut data = Vec::with_capacity(n);
            let mut replies = Vec::new();
            self.decoder.feed(&chunk[..n], &mut data, &mut replies);
            if !replies.is_empty() {
                self.stream.write_all(&replies).await.map_err(ChannelError::Io)?;
            }
            self.buffer.extend(&data);
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        // UTF-8 text never contains 0xFF, so no IAC escaping is needed.
        let line = format!("{line}\r\n");
        self.stream
            .write_all(line.as_bytes())
            .await
            .map_err(ChannelError::Io)?;
        Ok(())
    }
}

impl Shell for TelnetTransport {
    async fn send(&mut self, input: &str) -> Result<(), SessionError> {
        self.write_line(input).await
    }

    async fn send_secret(&mut self, secret: &SecretString) -> Result<(), SessionError> {
        self.write_line(secret.expose_secret()).await
    }

    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadResult, SessionError> {
        self.fill_until(&[pattern], timeout).await?;
        let prompt = self.buffer.last_line().to_string();
        let data = self.buffer.take();
        Ok(ReadResult { data, prompt })
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(mut self) -> Result<(), SessionError> {
        if self.closed {
            return Ok(());
        }
        self.stream.shutdown().await.map_err(ChannelError::Io)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Data,
    Iac,
    Option(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Splits a telnet byte stream into shell data and negotiation replies.
#[derive(Debug, Default)]
struct TelnetDecoder {
    state: DecodeState,
}

impl TelnetDecoder {
    fn feed(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (DecodeState::Data, IAC) => DecodeState::Iac,
                (DecodeState::Data, _) => {
                    data.push(byte);
                    DecodeState::Data
                }

                (DecodeState::Iac, IAC) => {
                    data.push(IAC);
                    DecodeState::Data
                }
                (DecodeState::Iac, DO | DONT | WILL | WONT) => DecodeState::Option(byte),
                (DecodeState::Iac, SB) => DecodeState::Subnegotiation,
                // NOP, GA, AYT and friends carry no data
                (DecodeState::Iac, _) => DecodeState::Data,

                (DecodeState::Option(command), option) => {
                    if let Some(reply) = negotiate(command, option) {
                        replies.extend_from_slice(&[IAC, reply, option]);
                    }
                    DecodeState::Data
                }

                (DecodeState::Subnegotiation, IAC) => DecodeState::SubnegotiationIac,
                (DecodeState::Subnegotiation, _) => DecodeState::Subnegotiation,
                (DecodeState::SubnegotiationIac, SE) => DecodeState::Data,
                (DecodeState::SubnegotiationIac, _) => DecodeState::Subnegotiation,
            };
        }
    }
}

/// Reply to one option request, or `None` when no reply is due.
fn negotiate(command: u8, option: u8) -> Option<u8> {
    match command {
        WILL if matches!(option, OPT_ECHO | OPT_SUPPRESS_GO_AHEAD) => Some(DO),
        WILL => Some(DONT),
        DO => Some(WONT),
        _ => None,
    }
}
