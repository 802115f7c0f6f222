// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation policy: the retention state machine.
//!
//! The tracker is `Accumulating` while it holds fewer snapshots than the
//! threshold. Recording the threshold-th snapshot moves it to the transient
//! `Rotating` phase, where every snapshot except the newest is retired into
//! one archive. The newest stays live and uncompacted so there is always a
//! directly restorable snapshot right after a rotation.
//!
//! Executing a plan (compaction, deletion, reset) is the caller's job; this
//! module only decides.

use crate::config::MIN_THRESHOLD;
use crate::snapshot::{Snapshot, SnapshotLabel};
use crate::tracker::RetentionTracker;
use thiserror::Error;

/// Extension of archives produced by the compaction tool
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("rotation threshold must be at least {MIN_THRESHOLD}, got {0}")]
    ThresholdTooSmall(usize),
}

/// Phase of the retention state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Accumulating,
    Rotating,
}

crate::simple_display! {
    Phase {
        Accumulating => "accumulating",
        Rotating => "rotating",
    }
}

/// Outcome of evaluating the tracker after a snapshot is recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Below threshold: keep accumulating
    Accumulate { count: usize, remaining: usize },
    /// Threshold reached: execute the plan, then reset the tracker
    Rotate(RotationPlan),
}

/// Which snapshots a rotation retires and which one it keeps live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    /// Oldest first; archived then deleted
    pub retire: Vec<Snapshot>,
    /// The newest snapshot, left untouched
    pub keep: Snapshot,
}

impl RotationPlan {
    /// Archive name derived from the labels bounding the retired range.
    pub fn archive_stem(&self) -> String {
        match (self.retire.first(), self.retire.last()) {
            (Some(first), Some(last)) if first.label != last.label => {
                format!("{}_{}", first.label, last.label)
            }
            (Some(only), _) => only.label.to_string(),
            _ => self.keep.label.to_string(),
        }
    }

    pub fn archive_file_name(&self) -> String {
        self.archive_file_name_variant(0)
    }

    /// `archive_file_name` with a `~N` marker, for when that name is taken.
    pub fn archive_file_name_variant(&self, n: u32) -> String {
        if n == 0 {
            format!("{}.{ARCHIVE_EXTENSION}", self.archive_stem())
        } else {
            format!("{}~{n}.{ARCHIVE_EXTENSION}", self.archive_stem())
        }
    }
}

/// Labels named by an archive file: the bounds of its retired range.
///
/// Accepts `<first>_<last>.tar.gz`, `<label>.tar.gz` and the `~N` forms used
/// when an archive name was already taken. Other names yield nothing.
pub fn archive_labels(file_name: &str) -> Vec<SnapshotLabel> {
    let Some(stem) = file_name.strip_suffix(ARCHIVE_EXTENSION).and_then(|s| s.strip_suffix('.'))
    else {
        return Vec::new();
    };
    let stem = stem.split_once('~').map_or(stem, |(stem, _)| stem);
    stem.split('_').filter(|s| !s.is_empty()).map(SnapshotLabel::from_string).collect()
}

/// Decides when the tracker rolls over into an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    threshold: usize,
}

impl RotationPolicy {
    pub fn new(threshold: usize) -> Result<Self, PolicyError> {
        if threshold < MIN_THRESHOLD {
            return Err(PolicyError::ThresholdTooSmall(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn phase(&self, tracker: &RetentionTracker) -> Phase {
        if tracker.count() >= self.threshold {
            Phase::Rotating
        } else {
            Phase::Accumulating
        }
    }

    /// Partition the tracker once it reaches the threshold.
    ///
    /// A tracker above the threshold (a previous rotation failed, or the
    /// threshold was lowered between runs) retires everything but the newest.
    pub fn evaluate(&self, tracker: &RetentionTracker) -> Decision {
        let count = tracker.count();
        if self.phase(tracker) == Phase::Accumulating {
            return Decision::Accumulate { count, remaining: self.threshold - count };
        }
        match tracker.snapshots().split_last() {
            Some((keep, retire)) => {
                Decision::Rotate(RotationPlan { retire: retire.to_vec(), keep: keep.clone() })
            }
            // unreachable with threshold >= 2
            None => Decision::Accumulate { count, remaining: self.threshold },
        }
    }
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
