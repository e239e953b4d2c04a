//! Device inventory: the rows of the input table as typed records.

mod loader;

pub use loader::{REQUIRED_COLUMNS, load, load_from_reader};

use std::fmt;

use serde::Serialize;

use crate::platform::DeviceKind;

/// Which of a record's two command sets a run sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSet {
    Implementation,
    Rollback,
}

impl CommandSet {
    /// Select the command set from the `--rollback` flag.
    pub fn from_rollback(rollback: bool) -> Self {
        if rollback {
            CommandSet::Rollback
        } else {
            CommandSet::Implementation
        }
    }
}

impl fmt::Display for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandSet::Implementation => f.write_str("implementation"),
            CommandSet::Rollback => f.write_str("rollback"),
        }
    }
}

/// One row of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Hostname or IP address; also the run-log key.
    pub name: String,

    /// Platform tag.
    pub kind: DeviceKind,

    /// Configuration lines applied in the forward direction.
    pub implementation_commands: Vec<String>,

    /// Operator-authored lines that undo the implementation.
    pub rollback_commands: Vec<String>,

    /// Read-only display commands run after the change. May be empty.
    pub verification_commands: Vec<String>,

    /// Source line in the input table.
    pub line: u64,
}

impl DeviceRecord {
    /// The lines for the given command set.
    pub fn commands(&self, command_set: CommandSet) -> &[String] {
        match command_set {
            CommandSet::Implementation => &self.implementation_commands,
            CommandSet::Rollback => &self.rollback_commands,
        }
    }

    /// Whether verification commands are present.
    pub fn has_verification(&self) -> bool {
        !self.verification_commands.is_empty()
    }
}
