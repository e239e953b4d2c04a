//! # ferrissh-batch
//!
//! Push per-device configuration command sets to a list of network
//! devices over SSH or telnet.
//!
//! A run reads a CSV device table, asks once for a password, and then for
//! every device in order: connects, enters privileged mode, sends either
//! the implementation or the rollback command set, optionally runs
//! verification commands, optionally asks before saving, saves, and
//! disconnects. A device that cannot be reached or rejects the
//! credentials is recorded as failed and the run moves on.
//!
//! ## Quick start
//!
//! ```no_run
//! use ferrissh_batch::{ArtifactWriter, BatchRunner, CliConnector, Credentials, RunLog, RunMode};
//! use ferrissh_batch::inventory::{self, CommandSet};
//!
//! # async fn example() -> ferrissh_batch::Result<()> {
//! let records = inventory::load("changes.csv", CommandSet::Implementation)?;
//! let connector = CliConnector::default();
//! let credentials = Credentials::new("netops", "secret");
//! let mut log = RunLog::open("output.log")?;
//!
//! let mut runner = BatchRunner::new(&connector, &credentials, RunMode::default(), ArtifactWriter::new("."));
//! let outcomes = runner.run(&records, &mut log).await?;
//! println!("{} devices processed", outcomes.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Supported platforms
//!
//! - `cisco_ios` - Cisco IOS / IOS-XE (`write memory`)
//! - `cisco_asa` - Cisco ASA (`write memory`)
//! - `juniper` - Juniper JUNOS (`commit`)
//! - `cisco_ios_telnet` - Cisco IOS over telnet (`write memory`)

pub mod channel;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod interrupt;
pub mod inventory;
pub mod platform;
pub mod report;
pub mod runner;
pub mod session;
pub mod transport;

pub use credentials::{CredentialProvider, Credentials, PromptCredentials};
pub use error::{Error, Result};
pub use inventory::{CommandSet, DeviceRecord};
pub use platform::{DeviceKind, PlatformProfile, SaveProcedure, SendMode, Transport};
pub use report::{ArtifactWriter, RunLog};
pub use runner::{BatchRunner, RunMode, RunOutcome};
pub use session::{CliConnector, Connector, DeviceSession};
