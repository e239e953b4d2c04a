use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use ferrissh_batch::cli::Cli;
use ferrissh_batch::credentials::{CredentialProvider, PromptCredentials};
use ferrissh_batch::error::{CredentialError, Error, Result};
use ferrissh_batch::interrupt::Interrupts;
use ferrissh_batch::report::{self, ArtifactWriter, RunLog};
use ferrissh_batch::runner::{self, BatchRunner, PromptConfirmer, Tally};
use ferrissh_batch::{CliConnector, inventory};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start the async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let interrupts = Interrupts::new();
    let result = runtime.block_on(async {
        tokio::select! {
            biased;
            never = interrupts.listen() => match never {},
            result = run(cli, &interrupts) => result,
        }
    });
    // A cancelled password prompt leaves its terminal read behind.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Credential(CredentialError::Cancelled)) => {
            eprintln!("Cancelled. No devices were touched.");
            ExitCode::from(130)
        }
        Err(e @ Error::Interrupted { .. }) => {
            eprintln!("{e}");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, interrupts: &Interrupts) -> Result<()> {
    let mode = cli.run_mode();
    let records = inventory::load(&cli.input, mode.command_set())?;
    info!("loaded {} device(s) from {}", records.len(), cli.input.display());

    let connector = CliConnector::new(cli.session_settings());
    runner::preflight(&connector, &records)?;
    if mode.confirm_before_save {
        runner::ensure_interactive()?;
    }

    let credentials = PromptCredentials::new(cli.username.clone(), interrupts.clone())
        .obtain()
        .await?;

    let mut log = RunLog::open(&cli.log_file)?;
    let mut batch = BatchRunner::new(
        &connector,
        &credentials,
        mode,
        ArtifactWriter::new(&cli.artifact_dir),
    )
    .with_confirmer(PromptConfirmer::new(interrupts.clone()))
    .with_interrupts(interrupts.clone());
    let result = batch.run(&records, &mut log).await;
    let log_path = log.finish()?;

    let outcomes = match result {
        Ok(outcomes) => outcomes,
        Err(e) => {
            eprintln!("Run aborted. See {} for details.", quoted(&log_path));
            return Err(e);
        }
    };

    if let Some(ref path) = cli.summary {
        report::write_summary(path, &outcomes)?;
    }

    let tally = Tally::from_outcomes(&outcomes);
    println!(
        "Completed. {} succeeded, {} failed. See {} for results.",
        tally.succeeded,
        tally.failed,
        quoted(&log_path)
    );
    Ok(())
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}
