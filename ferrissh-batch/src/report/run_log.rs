//! The run log: a durable, human-readable record of one run.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::error::ReportError;

/// Log file used when none is given.
pub const DEFAULT_LOG_FILE: &str = "output.log";

/// Severity of a run log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_log(self) -> log::Level {
        match self {
            LogLevel::Info => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => f.write_str("INFO"),
            LogLevel::Warning => f.write_str("WARNING"),
            LogLevel::Error => f.write_str("ERROR"),
        }
    }
}

/// Append-only, timestamped run log.
///
/// Each entry is written as `YYYY-mm-dd HH:MM:SS,mmm - LEVEL - message`
/// followed by a blank line and flushed immediately, so a run that aborts
/// half way still leaves a complete account of the devices it touched.
/// Entries are also forwarded to the `log` facade under the `run_log`
/// target.
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl RunLog {
    /// Open the log for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written by this run.
    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn info(&mut self, message: impl AsRef<str>) -> Result<(), ReportError> {
        self.record(LogLevel::Info, message.as_ref())
    }

    pub fn warning(&mut self, message: impl AsRef<str>) -> Result<(), ReportError> {
        self.record(LogLevel::Warning, message.as_ref())
    }

    pub fn error(&mut self, message: impl AsRef<str>) -> Result<(), ReportError> {
        self.record(LogLevel::Error, message.as_ref())
    }

    /// Append one entry and flush it to disk.
    pub fn record(&mut self, level: LogLevel, message: &str) -> Result<(), ReportError> {
        log::log!(target: "run_log", level.as_log(), "{message}");

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        write!(self.writer, "{timestamp} - {level} - {message}\n\n")
            .and_then(|()| self.writer.flush())
            .map_err(|source| ReportError::Io {
                path: self.path.clone(),
                source,
            })?;

        self.entries += 1;
        Ok(())
    }

    /// Flush and close the log, returning its path.
    pub fn finish(mut self) -> Result<PathBuf, ReportError> {
        self.writer.flush().map_err(|source| ReportError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(std::mem::take(&mut self.path))
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

impl fmt::Debug for RunLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunLog")
            .field("path", &self.path)
            .field("entries", &self.entries)
            .finish()
    }
}
