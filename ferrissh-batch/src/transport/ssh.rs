//! SSH transport implementation using russh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use regex::Regex;
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::config::{HostKeyVerification, SshConfig};
use super::{ReadResult, Shell};
use crate::channel::PatternBuffer;
use crate::error::{ChannelError, SessionError, TransportError};

/// Interval between SSH keepalives. They keep an idle session open while
/// the run waits on the operator, provided the runtime stays unblocked.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// SSH transport wrapping a russh client and its PTY shell channel.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Interactive shell channel.
    channel: Channel<Msg>,

    /// Output accumulated since the last match.
    buffer: PatternBuffer,

    /// Configuration used for this connection.
    config: SshConfig,
}

impl SshTransport {
    /// Connect, authenticate and open an interactive shell.
    pub async fn connect(config: SshConfig) -> Result<Self, SessionError> {
        debug!("connecting to {}", config.socket_addr());

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

        let ssh_config = Arc::new(client::Config {
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host: config.host.clone(),
            port: config.port,
            host_key_verification: config.host_key_verification,
            known_hosts_path: config.known_hosts_path.clone(),
            host_key_error: host_key_error.clone(),
        };

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect_stream(ssh_config, stream, handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(|e| {
            // Prefer the detailed host-key error over russh's generic one
            host_key_error
                .lock()
                .ok()
                .and_then(|mut slot| slot.take())
                .unwrap_or(TransportError::Ssh(e))
        })?;

        Self::authenticate(&mut session, &config).await?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        channel
            .request_pty(
                true,
                "xterm",
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellRequestFailed)?;

        Ok(Self {
            session,
            channel,
            buffer: PatternBuffer::new(config.search_depth),
            config,
        })
    }

    /// Authenticate with the server.
    async fn authenticate(
        session: &mut Handle<SshHandler>,
        config: &SshConfig,
    ) -> Result<(), SessionError> {
        let auth = tokio::time::timeout(
            config.timeout,
            session.authenticate_password(&config.username, config.password.expose_secret()),
        )
        .await
        .map_err(|_| TransportError::Timeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        if !auth.success() {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            }
            .into());
        }

        Ok(())
    }
}

impl Shell for SshTransport {
    async fn send(&mut self, input: &str) -> Result<(), SessionError> {
        let line = format!("{input}\n");
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn send_secret(&mut self, secret: &SecretString) -> Result<(), SessionError> {
        let line = format!("{}\n", secret.expose_secret());
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadResult, SessionError> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.buffer.tail_contains(pattern) {
                let prompt = self.buffer.last_line().to_string();
                let data = self.buffer.take();
                return Ok(ReadResult { data, prompt });
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { ref data }) => self.buffer.extend(data),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => self.buffer.extend(data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    fn host(&self) -> &str {
        &self.config.host
    }

    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    async fn close(self) -> Result<(), SessionError> {
        if let Err(e) = self.channel.eof().await {
            debug!("eof on {} failed: {}", self.config.host, e);
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// SSH client handler for russh.
struct SshHandler {
    host: String,
    port: u16,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    /// Stores a detailed host-key error so connect() can surface it
    /// instead of the generic russh::Error::UnknownKey.
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    /// Check the host key against known_hosts.
    ///
    /// Returns `Ok(true)` if matched, `Ok(false)` if host not found.
    fn check_known_hosts(&self, pubkey: &PublicKey) -> Result<bool, TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => russh::keys::check_known_hosts_path(&self.host, self.port, pubkey, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, pubkey),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    /// Save a new host key to known_hosts.
    fn learn_host_key(&self, pubkey: &PublicKey) -> Result<(), TransportError> {
        let result = match self.known_hosts_path {
            Some(ref path) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, pubkey, path)
            }
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, pubkey),
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }

    fn reject(&self, err: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(err);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        let accepted = match self.host_key_verification {
            HostKeyVerification::Disabled => true,

            HostKeyVerification::AcceptNew => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => {
                    if let Err(e) = self.learn_host_key(server_public_key) {
                        warn!("Failed to save host key for {}: {}", self.host, e);
                    }
                    true
                }
                Err(e) => self.reject(e),
            },

            HostKeyVerification::Strict => match self.check_known_hosts(server_public_key) {
                Ok(true) => true,
                Ok(false) => self.reject(TransportError::HostKeyUnknown {
                    host: self.host.clone(),
                    port: self.port,
                }),
                Err(e) => self.reject(e),
            },
        };

        Ok(accepted)
    }
}
