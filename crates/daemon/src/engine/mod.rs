// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup engine: produces snapshots, tracks them, rotates old ones out.

mod producer;
mod rotation;


pub use rotation::RotationReport;

use std::path::PathBuf;

use bk_adapters::{BackupTools, ToolError};
use bk_core::{Clock, Config, Phase, PolicyError, RetentionTracker, RotationPolicy, Snapshot};
use bk_storage::{StoreError, TrackerStore};
use thiserror::Error;

/// Errors from a single cycle step.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("cannot {action} {path}: {source}")]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free snapshot label left for {0}")]
    LabelsExhausted(String),

    #[error("tracker store error: {0}")]
    Store(#[from] StoreError),
}

impl CycleError {
    /// Fatal errors stop the daemon; the rest abandon the current attempt.
    pub fn is_fatal(&self) -> bool {
        match self {
            CycleError::Tool(ToolError::Io { .. }) => true,
            CycleError::Tool(_) => false,
            CycleError::Filesystem { .. }
            | CycleError::LabelsExhausted(_)
            | CycleError::Store(_) => true,
        }
    }
}

/// Outcome of [`Engine::run_cycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub snapshot: Snapshot,
    pub rotation: Option<RotationReport>,
}

/// Owns the tracker and drives tools against the configured roots.
pub struct Engine<T: BackupTools, C: Clock> {
    config: Config,
    tools: T,
    clock: C,
    policy: RotationPolicy,
    tracker: RetentionTracker,
    store: TrackerStore,
}

impl<T: BackupTools, C: Clock> Engine<T, C> {
    pub fn new(
        config: Config,
        tools: T,
        clock: C,
        tracker: RetentionTracker,
        store: TrackerStore,
    ) -> Result<Self, PolicyError> {
        let policy = RotationPolicy::new(config.archive_after_x)?;
        Ok(Self { config, tools, clock, policy, tracker, store })
    }

    pub fn tracker(&self) -> &RetentionTracker {
        &self.tracker
    }

    pub fn phase(&self) -> Phase {
        self.policy.phase(&self.tracker)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Append a completed snapshot and persist the tracker.
    pub fn record(&mut self, snapshot: Snapshot) -> Result<(), CycleError> {
        tracing::info!(
            label = %snapshot.label,
            count = self.tracker.count() + 1,
            threshold = self.policy.threshold(),
            "recorded snapshot"
        );
        self.tracker.record(snapshot);
        self.store.save(&self.tracker)?;
        Ok(())
    }

    /// Produce, record, then rotate if the threshold is reached.
    ///
    /// A failed production leaves the tracker untouched.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let snapshot = self.produce().await?;
        self.record(snapshot.clone())?;
        let rotation = self.settle().await?;
        Ok(CycleReport { snapshot, rotation })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
