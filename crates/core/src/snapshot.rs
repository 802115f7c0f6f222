// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot identity and metadata.
//!
//! A snapshot is one cycle's output: a directory under the snapshot root
//! holding the database dump and the copied data tree. Its label is the
//! local calendar date of the cycle, so two cycles on the same day share a
//! base label; [`SnapshotLabel::with_sequence`] derives the suffixed form
//! used to keep their directories apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Date format of the base label (`YYYY-MM-DD`)
pub const LABEL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Directory name of a snapshot under the snapshot root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotLabel(String);

impl SnapshotLabel {
    /// Base label for a cycle on `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self(date.format(LABEL_DATE_FORMAT).to_string())
    }

    /// Label for the `seq`-th extra snapshot on the same day (`seq` 0 is the base label).
    pub fn with_sequence(&self, seq: u32) -> Self {
        if seq == 0 {
            self.clone()
        } else {
            Self(format!("{}.{}", self.0, seq))
        }
    }

    /// Same-day sequence of this label relative to `base`, or `None` when it
    /// belongs to another day.
    pub fn sequence_of(&self, base: &SnapshotLabel) -> Option<u32> {
        let rest = self.0.strip_prefix(base.as_str())?;
        if rest.is_empty() {
            return Some(0);
        }
        rest.strip_prefix('.')?.parse().ok()
    }

    pub fn from_string(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the database dump file inside the snapshot directory.
    pub fn dump_file_name(&self, db_name: &str) -> String {
        format!("{db_name}-{}.sql", self.0)
    }
}

impl fmt::Display for SnapshotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub label: SnapshotLabel,
    pub path: PathBuf,
    pub created_at_ms: u64,
}

impl Snapshot {
    pub fn new(label: SnapshotLabel, root: &Path, created_at_ms: u64) -> Self {
        let path = root.join(label.as_str());
        Self { label, path, created_at_ms }
    }

    /// Whether the snapshot directory is still on disk.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
