// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot production: label allocation, data-store export, tree copy.

use bk_adapters::BackupTools;
use std::path::Path;

use bk_core::{archive_labels, Clock, Snapshot, SnapshotLabel};
use tracing::{info, warn};

use super::{CycleError, Engine};

/// Same-day snapshots beyond this many are refused.
pub(crate) const MAX_SAME_DAY_SNAPSHOTS: u32 = 1000;

impl<T: BackupTools, C: Clock> Engine<T, C> {
    /// Create one snapshot directory holding a database dump and a copy of
    /// the data tree.
    ///
    /// On a tool failure the directory is left in place and not recorded.
    pub async fn produce(&self) -> Result<Snapshot, CycleError> {
        let snapshot = self.allocate_snapshot()?;
        info!(label = %snapshot.label, path = %snapshot.path.display(), "producing snapshot");

        let dump_path = snapshot.path.join(snapshot.label.dump_file_name(&self.config.db.name));
        self.tools.export(&self.config.db, &dump_path).await?;
        self.tools.copy_tree(&self.config.data_path, &snapshot.path).await?;

        info!(label = %snapshot.label, "snapshot complete");
        Ok(snapshot)
    }

    /// Create a fresh directory named after today's date, suffixing `.N`
    /// when earlier snapshots already claimed the name.
    ///
    /// Labels are never reissued: numbering continues past every same-day
    /// label still on disk, tracked, or named by an archive, so a later
    /// rotation cannot produce an archive name that already exists.
    fn allocate_snapshot(&self) -> Result<Snapshot, CycleError> {
        let root = &self.config.backups_path;
        let base = SnapshotLabel::for_date(self.clock.today());
        let start = self.issued_sequence(&base)?.map_or(0, |seq| seq + 1);

        for seq in start..MAX_SAME_DAY_SNAPSHOTS {
            let label = base.with_sequence(seq);
            let path = root.join(label.as_str());
            match std::fs::create_dir(&path) {
                Ok(()) => {
                    if seq > 0 {
                        warn!(base = %base, label = %label, "label taken today, using suffix");
                    }
                    info!(path = %path.display(), "created directory");
                    return Ok(Snapshot::new(label, root, self.clock.epoch_ms()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(CycleError::Filesystem { action: "create", path, source });
                }
            }
        }
        Err(CycleError::LabelsExhausted(base.to_string()))
    }

    /// Highest same-day sequence already issued for `base`, if any.
    fn issued_sequence(&self, base: &SnapshotLabel) -> Result<Option<u32>, CycleError> {
        let mut labels: Vec<SnapshotLabel> = dir_names(&self.config.backups_path)?
            .into_iter()
            .map(SnapshotLabel::from_string)
            .collect();
        for name in dir_names(&self.config.archive_path)? {
            labels.extend(archive_labels(&name));
        }
        labels.extend(self.tracker.snapshots().iter().map(|s| s.label.clone()));

        Ok(labels.iter().filter_map(|label| label.sequence_of(base)).max())
    }
}

/// Entry names of `dir`; a missing directory has none.
fn dir_names(dir: &Path) -> Result<Vec<String>, CycleError> {
    let scan_err = |source: std::io::Error| CycleError::Filesystem {
        action: "scan",
        path: dir.to_path_buf(),
        source,
    };
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(scan_err(source)),
    };
    let mut names = Vec::new();
    for entry in entries {
        names.push(entry.map_err(scan_err)?.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}

#[cfg(test)]
#[path = "producer_tests.rs"]
mod tests;
