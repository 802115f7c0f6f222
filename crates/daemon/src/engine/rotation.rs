// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rotation: compact every snapshot but the newest, then delete them.

use std::path::{Path, PathBuf};

use bk_adapters::BackupTools;
use bk_core::{Clock, Decision, RotationPlan, SnapshotLabel};
use tracing::{debug, info, warn};

use super::{CycleError, Engine};

/// What a completed rotation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationReport {
    pub archive: PathBuf,
    pub retired: Vec<SnapshotLabel>,
    pub kept: SnapshotLabel,
}

impl<T: BackupTools, C: Clock> Engine<T, C> {
    /// Rotate if the tracker has reached the threshold.
    ///
    /// If compaction fails nothing is deleted and the tracker keeps its
    /// entries, so the next call retries the whole rotation.
    pub async fn settle(&mut self) -> Result<Option<RotationReport>, CycleError> {
        match self.policy.evaluate(&self.tracker) {
            Decision::Accumulate { count, remaining } => {
                info!(count, remaining, threshold = self.policy.threshold(), "accumulating");
                Ok(None)
            }
            Decision::Rotate(plan) => self.rotate(plan).await.map(Some),
        }
    }

    async fn rotate(&mut self, plan: RotationPlan) -> Result<RotationReport, CycleError> {
        let root = self.config.backups_path.clone();
        let archive = unused_archive_path(&self.config.archive_path, &plan);
        info!(
            retiring = plan.retire.len(),
            kept = %plan.keep.label,
            archive = %archive.display(),
            "threshold reached, rotating"
        );

        let entries: Vec<String> = plan
            .retire
            .iter()
            .filter(|s| {
                let present = s.exists();
                if !present {
                    warn!(label = %s.label, "retired snapshot already missing, not archived");
                }
                present
            })
            .map(|s| relative_entry(&root, &s.path))
            .collect();

        if entries.is_empty() {
            warn!("no retired snapshots left on disk, skipping compaction");
        } else {
            if let Err(e) = self.tools.compact(&archive, &root, &entries).await {
                discard_partial_archive(&archive);
                return Err(e.into());
            }
            info!(archive = %archive.display(), entries = entries.len(), "archive written");
        }

        for snapshot in &plan.retire {
            remove_snapshot_dir(&snapshot.path)?;
        }

        self.tracker.reset();
        self.store.save(&self.tracker)?;

        let report = RotationReport {
            archive,
            retired: plan.retire.into_iter().map(|s| s.label).collect(),
            kept: plan.keep.label,
        };
        info!(retired = report.retired.len(), kept = %report.kept, "rotation complete");
        Ok(report)
    }
}

/// Archive path for `plan`, marked `~N` when an earlier archive holds the name.
fn unused_archive_path(dir: &Path, plan: &RotationPlan) -> PathBuf {
    let preferred = dir.join(plan.archive_file_name());
    if !preferred.exists() {
        return preferred;
    }
    let mut n = 1;
    let path = loop {
        let candidate = dir.join(plan.archive_file_name_variant(n));
        if !candidate.exists() {
            break candidate;
        }
        n += 1;
    };
    warn!(
        taken = %preferred.display(),
        archive = %path.display(),
        "archive name taken, not overwriting"
    );
    path
}

/// Remove whatever a failed compaction left at `archive`.
fn discard_partial_archive(archive: &Path) {
    match std::fs::remove_file(archive) {
        Ok(()) => warn!(archive = %archive.display(), "removed partial archive"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(archive = %archive.display(), error = %e, "cannot remove partial archive")
        }
    }
}

/// Entry name for the compaction tool, relative to the snapshot root when possible.
fn relative_entry(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).to_string_lossy().into_owned()
}

/// Delete a retired snapshot; a directory that is already gone is fine.
fn remove_snapshot_dir(path: &Path) -> Result<(), CycleError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed snapshot directory");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "snapshot directory already removed");
            Ok(())
        }
        Err(source) => {
            Err(CycleError::Filesystem { action: "remove", path: path.to_path_buf(), source })
        }
    }
}

#[cfg(test)]
#[path = "rotation_tests.rs"]
mod tests;
