//! Opens device sessions over the transport each platform profile names.

use std::path::PathBuf;
use std::time::Duration;

use super::cli::{CliSession, combined_prompt_pattern};
use super::{ConnectParams, Connector};
use crate::credentials::Credentials;
use crate::error::{ChannelError, SessionError};
use crate::platform::Transport;
use crate::transport::{
    DeviceShell, HostKeyVerification, SshConfig, SshTransport, TelnetConfig, TelnetTransport,
};

/// Run-wide session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Connect, authentication and prompt timeout.
    pub timeout: Duration,

    /// Prompt timeout for save and commit, which can be slow.
    pub save_timeout: Duration,

    /// Bytes from the end of the output searched for a prompt.
    pub search_depth: usize,

    /// SSH host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// known_hosts file; `None` uses the user's default file.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            save_timeout: Duration::from_secs(120),
            search_depth: 1000,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }
}

impl SessionSettings {
    /// Set the connect and prompt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the save/commit timeout.
    pub fn with_save_timeout(mut self, timeout: Duration) -> Self {
        self.save_timeout = timeout;
        self
    }

    /// Set the host key verification mode.
    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn with_known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }
}

/// Opens [`CliSession`]s over SSH or telnet.
#[derive(Debug, Clone, Default)]
pub struct CliConnector {
    settings: SessionSettings,
}

impl CliConnector {
    /// Create a connector with the given settings.
    pub fn new(settings: SessionSettings) -> Self {
        Self { settings }
    }
}

impl Connector for CliConnector {
    type Session = CliSession<DeviceShell>;

    async fn connect(
        &self,
        params: &ConnectParams,
        credentials: &Credentials,
    ) -> Result<Self::Session, SessionError> {
        let platform = (params.kind.profile().definition)();

        let shell = match params.transport {
            Transport::Ssh => {
                let config = SshConfig {
                    host: params.host.clone(),
                    port: params.port,
                    username: credentials.username.clone(),
                    password: credentials.password_copy(),
                    timeout: self.settings.timeout,
                    terminal_width: platform.terminal_width,
                    terminal_height: platform.terminal_height,
                    search_depth: self.settings.search_depth,
                    host_key_verification: self.settings.host_key_verification,
                    known_hosts_path: self.settings.known_hosts_path.clone(),
                };
                DeviceShell::Ssh(SshTransport::connect(config).await?)
            }
            Transport::Telnet => {
                let config = TelnetConfig {
                    host: params.host.clone(),
                    port: params.port,
                    username: credentials.username.clone(),
                    password: credentials.password_copy(),
                    timeout: self.settings.timeout,
                    search_depth: self.settings.search_depth,
                    prompt_pattern: combined_prompt_pattern(&platform).map_err(ChannelError::from)?,
                };
                DeviceShell::Telnet(TelnetTransport::connect(config).await?)
            }
        };

        CliSession::start(shell, platform, credentials, &self.settings).await
    }
}
