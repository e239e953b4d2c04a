//! Error types for ferrissh-batch.
//!
//! Errors are layered the same way the tool runs: input loading,
//! credential entry, device sessions and reporting each have their own
//! enum, and [`Error`] collects them for the binary.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::platform::Transport;

/// Main error type for ferrissh-batch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The device table could not be loaded.
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Credentials could not be obtained.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// A device session failed in a way the runner does not recover from.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The run log, an artifact or the summary could not be written.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// The run was configured in a way that cannot work.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The operator pressed Ctrl-C outside a prompt.
    #[error("Interrupted; {remaining} device(s) not processed")]
    Interrupted { remaining: usize },
}

/// Malformed device table.
#[derive(Error, Debug)]
pub enum InputError {
    /// Failed to open the table.
    #[error("Cannot open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The table is not valid CSV.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A row is missing one of the required columns.
    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    MissingColumns {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The OS_Type cell is not a recognized platform tag.
    #[error("Line {line}: unknown device type '{value}'")]
    UnknownKind { line: u64, value: String },

    /// The command cell for the selected command set is empty.
    #[error("Line {line}: device '{device}' has no {command_set} commands")]
    MissingCommands {
        line: u64,
        device: String,
        command_set: String,
    },

    /// The same device name appears on two rows.
    #[error("Line {line}: device '{name}' already listed on line {first_line}")]
    DuplicateDevice {
        line: u64,
        name: String,
        first_line: u64,
    },
}

/// Credential entry errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The operator interrupted the prompt.
    #[error("Credential entry cancelled")]
    Cancelled,

    /// No local username could be determined and none was given.
    #[error("Cannot determine the local username; pass --username")]
    NoUsername,

    /// The terminal prompt failed.
    #[error("Password prompt failed: {0}")]
    Prompt(String),
}

/// Errors surfaced by a device session.
///
/// Only [`SessionError::ConnectionTimeout`] and
/// [`SessionError::AuthenticationFailure`] are recovered per device; the
/// runner lets every other variant abort the batch.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The device could not be reached or stopped answering in time.
    #[error("Connection timed out: {detail}")]
    ConnectionTimeout { detail: String },

    /// The device rejected the credentials.
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailure { user: String },

    /// Unexpected SSH transport error.
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// Unexpected channel error.
    #[error("Channel error: {0}")]
    Channel(ChannelError),

    /// Unexpected driver error.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl SessionError {
    /// The per-device failure class, or `None` when the error is not
    /// recoverable and should stop the run.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SessionError::ConnectionTimeout { .. } => Some(FailureKind::ConnectionTimeout),
            SessionError::AuthenticationFailure { .. } => Some(FailureKind::AuthenticationFailure),
            _ => None,
        }
    }

    /// Whether the runner isolates this error to the current device.
    pub fn is_recoverable(&self) -> bool {
        self.failure_kind().is_some()
    }
}

/// Recoverable per-device failure classes recorded in a run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FailureKind {
    ConnectionTimeout,
    AuthenticationFailure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ConnectionTimeout => write!(f, "ConnectionTimeout"),
            FailureKind::AuthenticationFailure => write!(f, "AuthenticationFailure"),
        }
    }
}

/// Transport layer errors (TCP connect, SSH handshake, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to open the TCP connection.
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed.
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// Host key not present in known_hosts (strict mode).
    #[error("Host key for {host}:{port} is not in known_hosts")]
    HostKeyUnknown { host: String, port: u16 },

    /// Host key differs from the one in known_hosts.
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// known_hosts could not be read or written.
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (PTY, prompt matching).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Failed to open the PTY shell.
    #[error("Failed to open PTY shell: {0}")]
    ShellRequestFailed(russh::Error),

    /// Pattern matching timed out.
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel closed unexpectedly.
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel.
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Read or write failure on a raw TCP stream.
    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (privilege navigation).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Failed to acquire target privilege level.
    #[error("Failed to acquire privilege level '{target}'")]
    PrivilegeAcquisitionFailed { target: String },

    /// Unknown privilege level detected.
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrivilege { prompt: String },

    /// No path found between privilege levels.
    #[error("No path from privilege '{from}' to '{to}'")]
    NoPrivilegePath { from: String, to: String },
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => SessionError::ConnectionTimeout {
                detail: format!("no response within {after:?}"),
            },
            TransportError::ConnectionFailed { host, port, source } => {
                SessionError::ConnectionTimeout {
                    detail: format!("TCP connection to {host}:{port} failed: {source}"),
                }
            }
            TransportError::AuthenticationFailed { user } => {
                SessionError::AuthenticationFailure { user }
            }
            other => SessionError::Transport(other),
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::PatternTimeout(after) => SessionError::ConnectionTimeout {
                detail: format!("device prompt not seen within {after:?}"),
            },
            other => SessionError::Channel(other),
        }
    }
}

/// Run log, artifact and summary write errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Cannot write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Invalid run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Confirmation was requested but nobody can answer.
    #[error("--verify needs an interactive terminal on stdin")]
    NotInteractive,

    /// A record needs a transport the connector cannot open.
    #[error("device '{device}' needs {transport}, which this tool cannot open")]
    UnsupportedTransport { device: String, transport: Transport },
}

/// Result type alias using ferrissh-batch's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_timeout_is_recoverable() {
        let err: SessionError = TransportError::Timeout(Duration::from_secs(5)).into();
        assert_eq!(err.failure_kind(), Some(FailureKind::ConnectionTimeout));
    }

    #[test]
    fn test_refused_connection_classifies_as_timeout() {
        let err: SessionError = TransportError::ConnectionFailed {
            host: "10.0.0.1".to_string(),
            port: 22,
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        }
        .into();
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("10.0.0.1:22"));
    }

    #[test]
    fn test_auth_failure_is_recoverable() {
        let err: SessionError = TransportError::AuthenticationFailed {
            user: "netops".to_string(),
        }
        .into();
        assert_eq!(err.failure_kind(), Some(FailureKind::AuthenticationFailure));
    }

    #[test]
    fn test_prompt_timeout_is_recoverable() {
        let err: SessionError = ChannelError::PatternTimeout(Duration::from_secs(30)).into();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_other_errors_abort() {
        let err: SessionError = ChannelError::Closed.into();
        assert!(!err.is_recoverable());

        let err: SessionError = DriverError::UnknownPrivilege {
            prompt: "???".to_string(),
        }
        .into();
        assert!(!err.is_recoverable());

        let err: SessionError = ChannelError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).into();
        assert!(err.failure_kind().is_none());
    }
}
