//! Run reporting.
//!
//! A run writes three kinds of record: the [`RunLog`], an append-only
//! timestamped account of every device; one verification artifact per
//! device that ran display commands; and, on request, a JSON summary of
//! all outcomes.

mod artifact;
mod run_log;
mod summary;
mod transcript;

pub use artifact::ArtifactWriter;
pub use run_log::{DEFAULT_LOG_FILE, LogLevel, RunLog};
pub use summary::write_summary;
pub use transcript::normalize_transcript;
