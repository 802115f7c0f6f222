// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: environment gate, directories, lock, tracker recovery.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;

use bk_adapters::{find_in, ToolKind};
use bk_core::{Config, RotationPolicy, ToolPrograms};
use bk_storage::TrackerStore;
use fs2::FileExt;
use tracing::{debug, info, warn};

use super::{DaemonState, LifecycleError, StartupResult};

/// Start the daemon using the process `PATH` for tool lookup.
pub fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    let search_path = std::env::var_os("PATH").unwrap_or_default();
    startup_with_search_path(config, &search_path)
}

/// Start the daemon, resolving tools against `search_path`.
///
/// Nothing under the snapshot or archive roots is created until every
/// required tool resolves and the data directory exists.
pub fn startup_with_search_path(
    config: &Config,
    search_path: &OsStr,
) -> Result<StartupResult, LifecycleError> {
    // 1. Environment gate
    check_requirements(&config.tools, search_path)?;
    if !config.data_path.is_dir() {
        return Err(LifecycleError::MissingDataDir(config.data_path.clone()));
    }
    let policy = RotationPolicy::new(config.archive_after_x)?;

    // 2. Roots
    ensure_dir(&config.backups_path)?;
    ensure_dir(&config.archive_path)?;

    // 3. Acquire lock before touching the tracker.
    // Open without truncating so a running daemon's PID survives a failed attempt.
    let lock_path = config.lock_path();
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 4. Recover tracker
    let store = TrackerStore::new(config.state_file());
    let loaded = store.load()?;
    if let Some(bak) = &loaded.quarantined {
        warn!(path = %bak.display(), "unreadable tracker state moved aside, starting empty");
    }
    let tracker = loaded.tracker;
    if !loaded.pruned.is_empty() || loaded.quarantined.is_some() {
        store.save(&tracker)?;
    }
    info!(
        snapshots = tracker.count(),
        threshold = policy.threshold(),
        phase = %policy.phase(&tracker),
        "recovered retention tracker"
    );

    let daemon = DaemonState { lock_file, lock_path, store };
    Ok(StartupResult { daemon, tracker })
}

/// Verify every configured tool resolves in `search_path`.
pub fn check_requirements(tools: &ToolPrograms, search_path: &OsStr) -> Result<(), LifecycleError> {
    let required = [
        (ToolKind::Export, tools.export.as_str()),
        (ToolKind::Copy, tools.copy.as_str()),
        (ToolKind::Compact, tools.compact.as_str()),
    ];
    for (kind, program) in required {
        match find_in(program, search_path) {
            Some(resolved) => debug!(tool = %kind, path = %resolved.display(), "found tool"),
            None => {
                return Err(LifecycleError::MissingTool { kind, program: program.to_string() })
            }
        }
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), LifecycleError> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| LifecycleError::CreateDir(path.to_path_buf(), e))?;
    info!(path = %path.display(), "created directory");
    Ok(())
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
