//! The device-batch runner.
//!
//! Devices are processed strictly in input order, one at a time:
//!
//! ```text
//! Connect -> Escalate -> Execute -> Verify? -> Persist? -> Disconnect
//! ```
//!
//! Connection timeouts and authentication failures end only the device
//! they happen on. Any other session error aborts the run, after the open
//! session has been disconnected. Verification problems are logged as
//! notes and never change whether a device succeeded. Ctrl-C outside a
//! prompt stops the run before the next device.

mod confirm;
mod outcome;

pub use confirm::{PromptConfirmer, SaveConfirmer, ensure_interactive};
pub use outcome::{DeviceFailure, RunMode, RunOutcome, Tally};

use log::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{ConfigError, Error, ReportError, Result};
use crate::interrupt::Interrupts;
use crate::inventory::DeviceRecord;
use crate::report::{ArtifactWriter, RunLog, normalize_transcript};
use crate::session::{ConnectParams, Connector, DeviceSession};
use outcome::PendingOutcome;

/// Reject records whose transport the connector cannot open.
pub fn preflight<C: Connector>(connector: &C, records: &[DeviceRecord]) -> std::result::Result<(), ConfigError> {
    for record in records {
        let transport = record.kind.profile().transport;
        if !connector.supports(transport) {
            return Err(ConfigError::UnsupportedTransport {
                device: record.name.clone(),
                transport,
            });
        }
    }
    Ok(())
}

/// Drives a batch of device records through a [`Connector`].
pub struct BatchRunner<'a, C, F = PromptConfirmer> {
    connector: &'a C,
    credentials: &'a Credentials,
    mode: RunMode,
    artifacts: ArtifactWriter,
    confirmer: F,
    interrupts: Interrupts,
}

impl<'a, C: Connector> BatchRunner<'a, C> {
    /// Create a runner that confirms saves on the terminal when the mode
    /// asks for it.
    pub fn new(
        connector: &'a C,
        credentials: &'a Credentials,
        mode: RunMode,
        artifacts: ArtifactWriter,
    ) -> Self {
        Self {
            connector,
            credentials,
            mode,
            artifacts,
            confirmer: PromptConfirmer::default(),
            interrupts: Interrupts::new(),
        }
    }
}

impl<'a, C: Connector, F: SaveConfirmer> BatchRunner<'a, C, F> {
    /// Use a different save confirmer.
    pub fn with_confirmer<G: SaveConfirmer>(self, confirmer: G) -> BatchRunner<'a, C, G> {
        BatchRunner {
            connector: self.connector,
            credentials: self.credentials,
            mode: self.mode,
            artifacts: self.artifacts,
            confirmer,
            interrupts: self.interrupts,
        }
    }

    /// Stop before the next device once Ctrl-C is pressed on `interrupts`.
    pub fn with_interrupts(mut self, interrupts: Interrupts) -> Self {
        self.interrupts = interrupts;
        self
    }

    /// Process every record and return one outcome per record.
    pub async fn run(&mut self, records: &[DeviceRecord], log: &mut RunLog) -> Result<Vec<RunOutcome>> {
        let command_set = self.mode.command_set();
        log.info(format!(
            "Starting {command_set} run on {} device(s)",
            records.len()
        ))?;

        let mut outcomes = Vec::with_capacity(records.len());
        for record in records {
            if self.interrupts.stop_requested() {
                let remaining = records.len() - outcomes.len();
                log.warning(format!(
                    "Interrupted by operator before {}; {remaining} device(s) not processed",
                    record.name
                ))?;
                return Err(Error::Interrupted { remaining });
            }

            let outcome = self.process(record, log).await?;
            debug!(
                "{}: succeeded={} saved={}",
                outcome.device_name, outcome.succeeded, outcome.saved
            );
            outcomes.push(outcome);
        }

        let tally = Tally::from_outcomes(&outcomes);
        log.info(format!(
            "Run finished: {} succeeded, {} failed, {} saved",
            tally.succeeded, tally.failed, tally.saved
        ))?;
        Ok(outcomes)
    }

    async fn process(&mut self, record: &DeviceRecord, log: &mut RunLog) -> Result<RunOutcome> {
        let mut pending = PendingOutcome::begin(record, self.mode.command_set());
        let params = ConnectParams::for_record(record);

        println!("Connecting to {} ({})", record.name, record.kind);
        let mut session = match self.connector.connect(&params, self.credentials).await {
            Ok(session) => session,
            Err(err) => {
                let Some(failure) = DeviceFailure::from_session_error(&err) else {
                    log.error(format!(
                        "Unexpected error connecting to {}, aborting run: {err}",
                        record.name
                    ))?;
                    return Err(err.into());
                };
                println!("Failed to connect to {}: {err}", record.name);
                log.error(format!("Failed to connect to {}: {err}", record.name))?;
                return Ok(pending.fail(failure));
            }
        };
        log.info(format!("Successfully connected to {}", record.name))?;

        let result = self.drive(&mut session, record, &mut pending, log).await;
        let settled = settle(record, result, log);
        let closed = disconnect(session, record, log).await;

        let failure = settled?;
        closed?;

        Ok(match failure {
            Some(failure) => pending.fail(failure),
            None => pending.complete(),
        })
    }

    /// Escalate, execute, verify and persist on an open session.
    async fn drive(
        &mut self,
        session: &mut C::Session,
        record: &DeviceRecord,
        pending: &mut PendingOutcome,
        log: &mut RunLog,
    ) -> Result<()> {
        let profile = record.kind.profile();
        let command_set = self.mode.command_set();

        session.enable().await?;

        println!("Sending {command_set} commands to {}", record.name);
        let response = session
            .send_config_set(record.commands(command_set), profile.send_mode(command_set))
            .await?;

        let transcript = normalize_transcript(&response.raw_result);
        log.info(format!("Actions on {}:\n{}", record.name, transcript))?;
        if let Some(ref failure) = response.failure_message {
            println!("Warning: {} reported an error: {failure}", record.name);
            log.warning(format!(
                "{} reported an error while applying {command_set} commands: {failure}",
                record.name
            ))?;
        }
        pending.captured_output = transcript;

        if record.has_verification() {
            self.verify(session, record, pending, log).await?;
        }

        if self.mode.confirm_before_save && !self.confirmer.confirm_save(&record.name).await {
            println!("Changes NOT saved on {}", record.name);
            log.info(format!("User declined, changes NOT saved on {}", record.name))?;
            return Ok(());
        }

        let response = session.save(&profile.save).await?;
        match response.failure_message {
            None => {
                pending.saved = true;
                println!("Saved configuration on {}", record.name);
                log.info(format!(
                    "Saved config changes on {} ({})",
                    record.name,
                    profile.save.describe()
                ))?;
            }
            Some(failure) => {
                println!("Save on {} reported an error; changes may NOT be saved", record.name);
                log.warning(format!(
                    "Save on {} reported '{failure}', changes may NOT be saved:\n{}",
                    record.name,
                    normalize_transcript(&response.raw_result)
                ))?;
            }
        }

        Ok(())
    }

    /// Run the display commands. Session errors end verification but not
    /// the device.
    async fn verify(
        &mut self,
        session: &mut C::Session,
        record: &DeviceRecord,
        pending: &mut PendingOutcome,
        log: &mut RunLog,
    ) -> std::result::Result<(), ReportError> {
        let mut captures = Vec::with_capacity(record.verification_commands.len());

        for command in &record.verification_commands {
            match session.send_command(command).await {
                Ok(response) => {
                    println!("{}", response.result);
                    log.info(format!(
                        "Verification output from {} for '{command}':\n{}",
                        record.name, response.result
                    ))?;
                    captures.push((command.clone(), response.result));
                }
                Err(err) => {
                    warn!("{}: verification '{command}' failed: {err}", record.name);
                    println!("Verification command '{command}' failed on {}: {err}", record.name);
                    log.warning(format!(
                        "Verification command '{command}' failed on {}: {err}",
                        record.name
                    ))?;
                    break;
                }
            }
        }

        if captures.is_empty() {
            return Ok(());
        }

        match self.artifacts.write(&record.name, &captures) {
            Ok(path) => log.info(format!(
                "Verification output for {} written to {}",
                record.name,
                path.display()
            ))?,
            Err(err) => {
                warn!("{}: {err}", record.name);
                log.warning(format!(
                    "Could not write verification output for {}: {err}",
                    record.name
                ))?;
            }
        }

        pending.verification_output = Some(
            captures
                .iter()
                .map(|(_, output)| output.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
        Ok(())
    }
}

/// Turn the result of a device's steps into a failure record, or an error
/// that aborts the run.
fn settle(record: &DeviceRecord, result: Result<()>, log: &mut RunLog) -> Result<Option<DeviceFailure>> {
    let err = match result {
        Ok(()) => return Ok(None),
        Err(Error::Session(err)) => err,
        Err(other) => return Err(other),
    };

    match DeviceFailure::from_session_error(&err) {
        Some(failure) => {
            println!("Failed on {}: {err}", record.name);
            log.error(format!("Failed on {}: {err}", record.name))?;
            Ok(Some(failure))
        }
        None => {
            log.error(format!(
                "Unexpected error on {}, aborting run: {err}",
                record.name
            ))?;
            Err(err.into())
        }
    }
}

async fn disconnect<S: DeviceSession>(
    session: S,
    record: &DeviceRecord,
    log: &mut RunLog,
) -> std::result::Result<(), ReportError> {
    match session.disconnect().await {
        Ok(()) => {
            debug!("{}: disconnected", record.name);
            Ok(())
        }
        Err(err) => {
            warn!("{}: disconnect failed: {err}", record.name);
            log.warning(format!("Disconnect from {} failed: {err}", record.name))
        }
    }
}
