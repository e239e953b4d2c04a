//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::report::DEFAULT_LOG_FILE;
use crate::runner::RunMode;
use crate::session::SessionSettings;
use crate::transport::HostKeyVerification;

/// Push per-device configuration command sets over SSH or telnet.
///
/// INPUT_CSV lists one device per row after a header row:
/// DeviceName, OS_Type, ImplementationCommands, RollbackCommands and an
/// optional VerificationCommands column. OS_Type is one of cisco_ios,
/// cisco_ios_telnet, cisco_asa or juniper.
#[derive(Parser, Debug)]
#[command(name = "ferrissh-batch", version, about, long_about)]
pub struct Cli {
    /// Device table
    #[arg(value_name = "INPUT_CSV")]
    pub input: PathBuf,

    /// Send the rollback commands instead of the implementation commands
    #[arg(short = 'r', long)]
    pub rollback: bool,

    /// Ask before saving the configuration of each device
    #[arg(short = 'v', long)]
    pub verify: bool,

    /// Login name [default: the local username]
    #[arg(short = 'u', long, value_name = "USER")]
    pub username: Option<String>,

    /// Run log, appended to
    #[arg(short = 'l', long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Directory for verification output files
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    pub artifact_dir: PathBuf,

    /// Connect and prompt timeout in seconds
    #[arg(short = 't', long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Host key checking
    #[arg(long, value_enum, value_name = "MODE", default_value_t = HostKeyVerification::AcceptNew)]
    pub host_key: HostKeyVerification,

    /// known_hosts file [default: ~/.ssh/known_hosts]
    #[arg(long, value_name = "PATH")]
    pub known_hosts: Option<PathBuf>,

    /// Write a JSON summary of every device outcome
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,
}

impl Cli {
    /// Batch-wide run flags.
    pub fn run_mode(&self) -> RunMode {
        RunMode {
            rollback: self.rollback,
            confirm_before_save: self.verify,
        }
    }

    /// Session settings from the connection flags.
    pub fn session_settings(&self) -> SessionSettings {
        let settings = SessionSettings::default()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_host_key_verification(self.host_key);

        match self.known_hosts {
            Some(ref path) => settings.with_known_hosts_path(path),
            None => settings,
        }
    }
}
