// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup gate, shutdown, signals.

mod startup;
pub use startup::{check_requirements, startup, startup_with_search_path};

use std::fs::File;
use std::path::PathBuf;

use bk_adapters::ToolKind;
use bk_core::{PolicyError, RetentionTracker};
use bk_storage::{StoreError, TrackerStore};
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Daemon state held for the life of the process.
///
/// Dropping it removes the lock file, so every exit path after a successful
/// startup cleans up, not only [`DaemonState::shutdown`].
pub struct DaemonState {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    lock_path: PathBuf,
    /// Where the tracker is persisted after every change
    pub store: TrackerStore,
}

/// Result of daemon startup
pub struct StartupResult {
    pub daemon: DaemonState,
    /// Tracker recovered from the previous run (vanished snapshots pruned)
    pub tracker: RetentionTracker,
}

impl DaemonState {
    /// Stop the daemon, removing the lock file and releasing the lock.
    pub fn shutdown(self) {
        info!("shutting down daemon");
        drop(self);
        info!("daemon shutdown complete");
    }
}

impl Drop for DaemonState {
    fn drop(&mut self) {
        // The lock itself is released when `lock_file` drops after this.
        match std::fs::remove_file(&self.lock_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove lock file: {}", e),
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("required {kind} tool `{program}` not found in search path")]
    MissingTool { kind: ToolKind, program: String },

    #[error("data directory {0} does not exist")]
    MissingDataDir(PathBuf),

    #[error("cannot create directory {0}: {1}")]
    CreateDir(PathBuf, #[source] std::io::Error),

    #[error("failed to acquire lock: another backup daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("invalid rotation policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("tracker store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Cancel `token` on SIGINT or SIGTERM.
///
/// Handlers are registered before returning so no signal is missed once the
/// loop starts.
pub fn cancel_on_signal(token: CancellationToken) -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("received SIGINT"),
            _ = sigterm.recv() => info!("received SIGTERM"),
        }
        token.cancel();
    });
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
