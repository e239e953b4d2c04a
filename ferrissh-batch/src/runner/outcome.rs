//! Per-device results of a run.

use serde::Serialize;

use crate::error::{FailureKind, SessionError};
use crate::inventory::{CommandSet, DeviceRecord};
use crate::platform::DeviceKind;

/// Flags fixed for the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunMode {
    /// Send the rollback command set instead of the implementation set.
    pub rollback: bool,

    /// Ask the operator before saving each device.
    pub confirm_before_save: bool,
}

impl RunMode {
    /// The command set this run sends.
    pub fn command_set(&self) -> CommandSet {
        CommandSet::from_rollback(self.rollback)
    }
}

/// A recoverable failure that ended one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl DeviceFailure {
    /// Classify a session error; `None` when it must abort the run.
    pub fn from_session_error(err: &SessionError) -> Option<Self> {
        err.failure_kind().map(|kind| Self {
            kind,
            message: err.to_string(),
        })
    }
}

/// What happened to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub device_name: String,
    pub kind: DeviceKind,

    /// The command set was applied and no recoverable error ended the
    /// device.
    pub succeeded: bool,

    pub command_set: CommandSet,

    /// Normalized transcript of the command set.
    pub captured_output: String,

    /// Output of the verification commands, when any ran.
    pub verification_output: Option<String>,

    /// The save procedure ran and reported no failure.
    pub saved: bool,

    pub error: Option<DeviceFailure>,
}

/// Outcome under construction while a device is processed.
#[derive(Debug)]
pub(crate) struct PendingOutcome {
    device_name: String,
    kind: DeviceKind,
    command_set: CommandSet,
    pub(crate) captured_output: String,
    pub(crate) verification_output: Option<String>,
    pub(crate) saved: bool,
}

impl PendingOutcome {
    pub(crate) fn begin(record: &DeviceRecord, command_set: CommandSet) -> Self {
        Self {
            device_name: record.name.clone(),
            kind: record.kind,
            command_set,
            captured_output: String::new(),
            verification_output: None,
            saved: false,
        }
    }

    /// Finalize as completed.
    pub(crate) fn complete(self) -> RunOutcome {
        self.finish(None)
    }

    /// Finalize as failed.
    pub(crate) fn fail(self, failure: DeviceFailure) -> RunOutcome {
        self.finish(Some(failure))
    }

    fn finish(self, error: Option<DeviceFailure>) -> RunOutcome {
        RunOutcome {
            device_name: self.device_name,
            kind: self.kind,
            succeeded: error.is_none(),
            command_set: self.command_set,
            captured_output: self.captured_output,
            verification_output: self.verification_output,
            saved: self.saved,
            error,
        }
    }
}

/// Counts over a run's outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub saved: usize,
}

impl Tally {
    pub fn from_outcomes(outcomes: &[RunOutcome]) -> Self {
        outcomes.iter().fold(Tally::default(), |mut tally, outcome| {
            if outcome.succeeded {
                tally.succeeded += 1;
            } else {
                tally.failed += 1;
            }
            if outcome.saved {
                tally.saved += 1;
            }
            tally
        })
    }
}
