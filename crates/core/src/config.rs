// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration, loaded once at startup from a JSON document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Smallest accepted rotation threshold. Below two, "all but the newest" is empty.
pub const MIN_THRESHOLD: usize = 2;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Data-store credentials handed to the export tool.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    pub name: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Program names for the three external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPrograms {
    pub export: String,
    pub copy: String,
    pub compact: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self { export: "mysqldump".into(), copy: "rsync".into(), compact: "tar".into() }
    }
}

impl ToolPrograms {
    /// Export, copy and compact programs, in that order.
    pub fn required(&self) -> [&str; 3] {
        [self.export.as_str(), self.copy.as_str(), self.compact.as_str()]
    }
}

/// Retry behaviour for failed cycles and rotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per step, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_secs: 60 }
    }
}

impl RetryConfig {
    /// Backoff to wait after the given failed attempt (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_secs(self.backoff_secs.saturating_mul(factor))
    }
}

/// Immutable agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub db: DbConfig,
    #[serde(rename = "log_file_path")]
    pub log_path: PathBuf,
    pub data_path: PathBuf,
    pub backups_path: PathBuf,
    pub archive_path: PathBuf,
    pub every_x_days: u32,
    pub archive_after_x: usize,
    #[serde(default)]
    pub tools: ToolPrograms,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Where the retention tracker is persisted (default: inside `backups_path`)
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Upper bound for a single external tool run; `None` waits forever
    #[serde(default)]
    pub tool_timeout_secs: Option<u64>,
}

impl Config {
    /// Read, parse, and validate the configuration document.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&raw).map_err(|e| match e {
            ConfigError::Parse { source, .. } => {
                ConfigError::Parse { path: path.to_path_buf(), source }
            }
            other => other,
        })
    }

    /// Parse and validate a JSON configuration document.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|source| ConfigError::Parse { path: PathBuf::new(), source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db.name.trim().is_empty() {
            return Err(ConfigError::Invalid("db.name must not be empty".into()));
        }
        if self.every_x_days < 1 {
            return Err(ConfigError::Invalid("every_x_days must be at least 1".into()));
        }
        if self.archive_after_x < MIN_THRESHOLD {
            return Err(ConfigError::Invalid(format!(
                "archive_after_x must be at least {MIN_THRESHOLD}, got {}",
                self.archive_after_x
            )));
        }
        if self.retry.max_attempts < 1 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.tools.required().iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid("tool program names must not be empty".into()));
        }
        for (field, path) in [
            ("log_file_path", &self.log_path),
            ("data_path", &self.data_path),
            ("backups_path", &self.backups_path),
            ("archive_path", &self.archive_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// Delay between the end of one cycle and the start of the next.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.every_x_days) * SECS_PER_DAY)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    pub fn state_file(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(|| self.backups_path.join(".bk-tracker.json"))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.backups_path.join(".bk.lock")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
