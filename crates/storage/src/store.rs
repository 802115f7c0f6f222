// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable retention tracker.
//!
//! The tracker is rewritten after every append and every reset so a restart
//! resumes accumulation where it left off instead of starting from zero.
//! Writes go to a `.tmp` sibling, are fsynced, then renamed over the live
//! file; a crash mid-write leaves the previous document intact.

use bk_core::{RetentionTracker, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current tracker document schema version
pub const CURRENT_TRACKER_VERSION: u32 = 1;

const MAX_BAK_FILES: u32 = 3;

/// Errors that can occur in tracker persistence
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk form of the retention tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerDocument {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    pub snapshots: RetentionTracker,
    pub updated_at: DateTime<Utc>,
}

/// Result of loading the persisted tracker
#[derive(Debug, Default)]
pub struct LoadedTracker {
    pub tracker: RetentionTracker,
    /// Entries dropped because their directories no longer exist
    pub pruned: Vec<Snapshot>,
    /// Where an unreadable document was moved aside, if any
    pub quarantined: Option<PathBuf>,
}

/// Reads and writes the tracker document at a fixed path.
#[derive(Debug, Clone)]
pub struct TrackerStore {
    path: PathBuf,
}

impl TrackerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted tracker.
    ///
    /// A missing document yields an empty tracker. A document that cannot be
    /// parsed (or has an unknown version) is moved to a `.bak` file and an
    /// empty tracker is returned; IO failures other than "not found" are errors.
    pub fn load(&self) -> Result<LoadedTracker, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LoadedTracker::default());
            }
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };

        let doc = match serde_json::from_str::<TrackerDocument>(&raw) {
            Ok(doc) if doc.version == CURRENT_TRACKER_VERSION => doc,
            Ok(doc) => {
                tracing::warn!(
                    path = %self.path.display(),
                    version = doc.version,
                    "unsupported tracker version, starting empty"
                );
                return self.quarantine();
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt tracker document, starting empty"
                );
                return self.quarantine();
            }
        };

        let mut tracker = doc.snapshots;
        let pruned = tracker.retain_existing();
        for snapshot in &pruned {
            tracing::warn!(
                label = %snapshot.label,
                path = %snapshot.path.display(),
                "tracked snapshot directory vanished, dropping it"
            );
        }
        Ok(LoadedTracker { tracker, pruned, quarantined: None })
    }

    /// Atomically replace the persisted tracker.
    pub fn save(&self, tracker: &RetentionTracker) -> Result<(), StoreError> {
        let doc = TrackerDocument {
            version: CURRENT_TRACKER_VERSION,
            snapshots: tracker.clone(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&doc)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.io_err(parent, source))?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&json)?;
            file.sync_all()
        };
        write().map_err(|source| self.io_err(&tmp_path, source))?;
        fs::rename(&tmp_path, &self.path).map_err(|source| self.io_err(&self.path, source))?;

        tracing::debug!(path = %self.path.display(), count = tracker.count(), "saved tracker");
        Ok(())
    }

    fn quarantine(&self) -> Result<LoadedTracker, StoreError> {
        let bak = rotate_bak_path(&self.path);
        fs::rename(&self.path, &bak).map_err(|source| self.io_err(&self.path, source))?;
        Ok(LoadedTracker { quarantined: Some(bak), ..LoadedTracker::default() })
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
/// The oldest backup is removed when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        if let Err(e) = fs::remove_file(&oldest) {
            tracing::warn!(
                path = %oldest.display(),
                error = %e,
                "cannot remove oldest tracker backup"
            );
        }
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let dest = bak(n + 1);
            if let Err(e) = fs::rename(&src, &dest) {
                tracing::warn!(
                    from = %src.display(),
                    to = %dest.display(),
                    error = %e,
                    "cannot shift tracker backup"
                );
            }
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
