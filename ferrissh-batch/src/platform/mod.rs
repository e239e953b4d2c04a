//! Platform capability table.
//!
//! Every supported device kind maps to one [`PlatformProfile`]: how to
//! reach it, how the command set is sent, how changes are persisted, and
//! which prompt/privilege definition the SSH backend drives it with.
//! Adding a platform means adding a kind and a profile, not another branch
//! in the runner.

mod definition;
mod privilege_level;
pub mod vendors;

pub use definition::{DefaultBehavior, PlatformDefinition, VendorBehavior};
pub use privilege_level::PrivilegeLevel;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::inventory::CommandSet;

/// Platform tag from the OS_Type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    CiscoIos,
    CiscoIosTelnet,
    CiscoAsa,
    Juniper,
}

impl DeviceKind {
    /// All recognized kinds.
    pub const ALL: [DeviceKind; 4] = [
        DeviceKind::CiscoIos,
        DeviceKind::CiscoIosTelnet,
        DeviceKind::CiscoAsa,
        DeviceKind::Juniper,
    ];

    /// The tag as written in the input table.
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::CiscoIos => "cisco_ios",
            DeviceKind::CiscoIosTelnet => "cisco_ios_telnet",
            DeviceKind::CiscoAsa => "cisco_asa",
            DeviceKind::Juniper => "juniper",
        }
    }

    /// Capability profile for this kind.
    pub fn profile(self) -> &'static PlatformProfile {
        match self {
            DeviceKind::CiscoIos => &CISCO_IOS,
            DeviceKind::CiscoIosTelnet => &CISCO_IOS_TELNET,
            DeviceKind::CiscoAsa => &CISCO_ASA,
            DeviceKind::Juniper => &JUNIPER,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an OS_Type tag is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl FromStr for DeviceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        // "cisco" is the tag the first revision of the input table used.
        if tag == "cisco" {
            return Ok(DeviceKind::CiscoIos);
        }
        DeviceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| UnknownKind(s.trim().to_string()))
    }
}

/// How a session reaches the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Ssh,
    Telnet,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Ssh => f.write_str("ssh"),
            Transport::Telnet => f.write_str("telnet"),
        }
    }
}

/// Whether a command set leaves the session in configuration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// Return to the previous privilege level after the last line.
    ExitConfig,
    /// Stay in configuration mode; the save step commits and exits.
    StayInConfig,
}

/// How a platform makes the running configuration durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveProcedure {
    /// A single non-interactive command from privileged mode.
    Command(&'static str),
    /// Candidate-configuration commit.
    Commit {
        /// Issued after entering configuration mode.
        commit: &'static str,
        /// Issued when configuration mode was left open by the command set.
        commit_and_exit: &'static str,
    },
}

impl SaveProcedure {
    /// Command text for the run log.
    pub fn describe(&self) -> &'static str {
        match self {
            SaveProcedure::Command(command) => command,
            SaveProcedure::Commit { commit, .. } => commit,
        }
    }
}

/// Capability row for one device kind.
#[derive(Debug, Clone, Copy)]
pub struct PlatformProfile {
    /// Session transport.
    pub transport: Transport,

    /// Default port for the transport.
    pub port: u16,

    /// Save procedure.
    pub save: SaveProcedure,

    /// Send mode for the implementation command set.
    pub implementation_send_mode: SendMode,

    /// Prompt and privilege definition for the CLI driver.
    pub definition: fn() -> PlatformDefinition,
}

impl PlatformProfile {
    /// Send mode for the given command set. Rollback always exits
    /// configuration mode.
    pub fn send_mode(&self, command_set: CommandSet) -> SendMode {
        match command_set {
            CommandSet::Implementation => self.implementation_send_mode,
            CommandSet::Rollback => SendMode::ExitConfig,
        }
    }
}

const WRITE_MEMORY: SaveProcedure = SaveProcedure::Command("write memory");

static CISCO_IOS: PlatformProfile = PlatformProfile {
    transport: Transport::Ssh,
    port: 22,
    save: WRITE_MEMORY,
    implementation_send_mode: SendMode::ExitConfig,
    definition: vendors::cisco_ios::platform,
};

static CISCO_IOS_TELNET: PlatformProfile = PlatformProfile {
    transport: Transport::Telnet,
    port: 23,
    save: WRITE_MEMORY,
    implementation_send_mode: SendMode::ExitConfig,
    definition: vendors::cisco_ios::platform,
};

static CISCO_ASA: PlatformProfile = PlatformProfile {
    transport: Transport::Ssh,
    port: 22,
    save: WRITE_MEMORY,
    implementation_send_mode: SendMode::ExitConfig,
    definition: vendors::cisco_asa::platform,
};

static JUNIPER: PlatformProfile = PlatformProfile {
    transport: Transport::Ssh,
    port: 22,
    save: SaveProcedure::Commit {
        commit: "commit",
        commit_and_exit: "commit and-quit",
    },
    implementation_send_mode: SendMode::StayInConfig,
    definition: vendors::juniper::platform,
};
