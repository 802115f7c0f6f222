// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention tracker: snapshots produced since the last rotation.
//!
//! Append-only between rotations. The size cap is enforced by the rotation
//! policy's trigger condition, not here.

use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

/// Ordered record of un-rotated snapshots, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetentionTracker {
    snapshots: Vec<Snapshot>,
}

impl RetentionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    pub fn record(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Clear after a completed rotation.
    pub fn reset(&mut self) {
        self.snapshots.clear();
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn newest(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Drop entries whose directories no longer exist, returning the dropped ones.
    pub fn retain_existing(&mut self) -> Vec<Snapshot> {
        let (kept, dropped): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.snapshots).into_iter().partition(Snapshot::exists);
        self.snapshots = kept;
        dropped
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
