// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::config::{Config, DbConfig, RetryConfig, ToolPrograms};
use crate::snapshot::{Snapshot, SnapshotLabel};
use std::path::{Path, PathBuf};

// ── Proptest strategies ─────────────────────────────────────────────────

/// Rotation thresholds worth exercising (the minimum and a spread above it).
pub fn arb_threshold() -> impl proptest::strategy::Strategy<Value = usize> {
    2usize..12
}

// ── Factories ───────────────────────────────────────────────────────────

/// Snapshot under a fixed `/backups` root, for tests that never touch disk.
pub fn snapshot(label: &str) -> Snapshot {
    Snapshot::new(SnapshotLabel::from_string(label), Path::new("/backups"), 0)
}

/// Config whose directories all live under `root`.
///
/// `data`, `backups`, and `archive` are not created; callers decide which
/// ones exist.
pub fn config_in(root: &Path, threshold: usize) -> Config {
    Config {
        db: DbConfig { name: "shop".into(), user: "backup".into(), password: "s3cret".into() },
        log_path: root.join("bk.log"),
        data_path: root.join("data"),
        backups_path: root.join("backups"),
        archive_path: root.join("archive"),
        every_x_days: 1,
        archive_after_x: threshold,
        tools: ToolPrograms::default(),
        retry: RetryConfig { max_attempts: 1, backoff_secs: 0 },
        state_file: None,
        tool_timeout_secs: None,
    }
}

/// Paths of every entry directly under `dir`, sorted by name.
pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|rd| rd.flatten().map(|e| e.path()).collect())
        .unwrap_or_default();
    entries.sort();
    entries
}
