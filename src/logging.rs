//! Logger installation for the binary.
//!
//! Library code only talks to the `log` facade; whether anything is written, and where, is
//! decided here.
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use env_logger::{Builder, Env, Target};
use thiserror::Error;

const LOG_FILE_STAMP: &str = "%Y%m%d_%H%M%S";
const LOG_LINE_STAMP: &str = "%a, %d %b %Y %H:%M:%S";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    LogFileOpen { path: String, source: io::Error },

    #[error("A logger is already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Logs to stderr, filtered by `RUST_LOG` (warnings and errors by default).
pub fn init_stderr() -> Result<(), LoggingError> {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init()?;
    Ok(())
}

/// Path of the log file a run started now would append to.
pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.log", Local::now().format(LOG_FILE_STAMP)))
}

/// Appends log lines to a timestamped file inside `dir` and returns its path.
pub fn init_file(dir: &Path) -> Result<PathBuf, LoggingError> {
    let path = log_file_path(dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::LogFileOpen {
            path: path.display().to_string(),
            source,
        })?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:<8}] {}",
                Local::now().format(LOG_LINE_STAMP),
                record.level(),
                record.args()
            )
        })
        .try_init()?;

    Ok(path)
}
