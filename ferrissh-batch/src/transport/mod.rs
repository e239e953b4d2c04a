//! Transport layer.
//!
//! A transport owns one connection to a device and the interactive shell
//! the CLI driver talks to. SSH goes through russh; telnet runs over a
//! plain TCP stream. Both implement [`Shell`], which is all the session
//! layer sees.

pub mod config;
mod ssh;
mod telnet;

pub use config::{HostKeyVerification, SshConfig, TelnetConfig};
pub use ssh::SshTransport;
pub use telnet::TelnetTransport;

use std::future::Future;
use std::time::Duration;

use regex::Regex;
use secrecy::SecretString;

use crate::error::SessionError;

/// Output read up to a prompt.
#[derive(Debug)]
pub struct ReadResult {
    /// Everything read, including the command echo and the prompt.
    pub data: String,

    /// The last line of `data`.
    pub prompt: String,
}

/// An interactive line-oriented shell on a device.
pub trait Shell: Send {
    /// Send one line of input.
    fn send(&mut self, input: &str) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Send a secret line without logging it.
    fn send_secret(
        &mut self,
        secret: &SecretString,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Read until `pattern` matches the tail of the output.
    fn read_until(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<ReadResult, SessionError>> + Send;

    /// Host this shell is connected to.
    fn host(&self) -> &str;

    /// Whether the connection has gone away.
    fn is_closed(&self) -> bool;

    /// Close the connection.
    fn close(self) -> impl Future<Output = Result<(), SessionError>> + Send;
}

/// A shell over whichever transport the device's platform profile names.
pub enum DeviceShell {
    Ssh(SshTransport),
    Telnet(TelnetTransport),
}

impl Shell for DeviceShell {
    async fn send(&mut self, input: &str) -> Result<(), SessionError> {
        match self {
            DeviceShell::Ssh(t) => t.send(input).await,
            DeviceShell::Telnet(t) => t.send(input).await,
        }
    }

    async fn send_secret(&mut self, secret: &SecretString) -> Result<(), SessionError> {
        match self {
            DeviceShell::Ssh(t) => t.send_secret(secret).await,
            DeviceShell::Telnet(t) => t.send_secret(secret).await,
        }
    }

    async fn read_until(&mut self, pattern: &Regex, timeout: Duration) -> Result<ReadResult, SessionError> {
        match self {
            DeviceShell::Ssh(t) => t.read_until(pattern, timeout).await,
            DeviceShell::Telnet(t) => t.read_until(pattern, timeout).await,
        }
    }

    fn host(&self) -> &str {
        match self {
            DeviceShell::Ssh(t) => t.host(),
            DeviceShell::Telnet(t) => t.host(),
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            DeviceShell::Ssh(t) => t.is_closed(),
            DeviceShell::Telnet(t) => t.is_closed(),
        }
    }

    async fn close(self) -> Result<(), SessionError> {
        match self {
            DeviceShell::Ssh(t) => t.close().await,
            DeviceShell::Telnet(t) => t.close().await,
        }
    }
}
