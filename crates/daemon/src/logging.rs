// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log sink setup: every event goes to stdout and to the configured log file.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid log filter `{filter}`: {message}")]
    Filter { filter: String, message: String },

    #[error("logging already initialized: {0}")]
    Init(String),
}

/// Open `log_path` for appending and install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// life of the process.
pub fn init(log_path: &Path) -> Result<WorkerGuard, LoggingError> {
    let file = open_log_file(log_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let directive = crate::env::log_filter();
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| LoggingError::Filter { filter: directive.clone(), message: e.to_string() })?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(std::io::stdout().is_terminal()))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(guard)
}

pub(crate) fn open_log_file(log_path: &Path) -> Result<std::fs::File, LoggingError> {
    let open_err = |source| LoggingError::Open { path: log_path.to_path_buf(), source };
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(open_err)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(log_path).map_err(open_err)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
