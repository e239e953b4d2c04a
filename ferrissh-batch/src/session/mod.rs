//! Device session capability.
//!
//! The batch runner drives devices through two traits: a [`Connector`]
//! opens sessions and a [`DeviceSession`] sends configuration lines,
//! display commands and save procedures. [`CliConnector`] and
//! [`CliSession`] implement them over SSH and telnet; tests substitute
//! scripted sessions.

mod cli;
mod connector;
mod privilege;
mod response;

pub use cli::{CliSession, combined_prompt_pattern};
pub use connector::{CliConnector, SessionSettings};
pub use privilege::{PrivilegeManager, TransitionInfo};
pub use response::Response;

use std::future::Future;

use crate::credentials::Credentials;
use crate::error::SessionError;
use crate::inventory::DeviceRecord;
use crate::platform::{DeviceKind, SaveProcedure, SendMode, Transport};

/// Where and how to open one device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Hostname or IP address.
    pub host: String,

    /// Platform tag; selects the CLI definition.
    pub kind: DeviceKind,

    /// Transport from the platform profile.
    pub transport: Transport,

    /// Port from the platform profile.
    pub port: u16,
}

impl ConnectParams {
    /// Derive connection parameters from a record's platform profile.
    pub fn for_record(record: &DeviceRecord) -> Self {
        let profile = record.kind.profile();
        Self {
            host: record.name.clone(),
            kind: record.kind,
            transport: profile.transport,
            port: profile.port,
        }
    }
}

/// Opens device sessions.
pub trait Connector {
    /// Session type produced by this connector.
    type Session: DeviceSession;

    /// Whether this connector can open sessions over `transport`.
    fn supports(&self, transport: Transport) -> bool {
        let _ = transport;
        true
    }

    /// Open and authenticate a session.
    fn connect(
        &self,
        params: &ConnectParams,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

/// An open CLI session on one device.
pub trait DeviceSession: Send {
    /// Raise the session to the level configuration changes are made from.
    fn enable(&mut self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Send configuration lines from configuration mode.
    ///
    /// The returned response carries the full transcript in `raw_result`.
    /// With [`SendMode::ExitConfig`] the session leaves configuration mode
    /// after the last line.
    fn send_config_set(
        &mut self,
        lines: &[String],
        mode: SendMode,
    ) -> impl Future<Output = Result<Response, SessionError>> + Send;

    /// Send a single display command and wait for the prompt.
    fn send_command(
        &mut self,
        command: &str,
    ) -> impl Future<Output = Result<Response, SessionError>> + Send;

    /// Persist the running configuration.
    fn save(
        &mut self,
        procedure: &SaveProcedure,
    ) -> impl Future<Output = Result<Response, SessionError>> + Send;

    /// Terminate the session.
    fn disconnect(self) -> impl Future<Output = Result<(), SessionError>> + Send;
}
