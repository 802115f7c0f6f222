// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cycle loop: one cycle at a time, retries with backoff, cancellable sleep.

use std::time::Duration;

use bk_adapters::BackupTools;
use bk_core::{Clock, RetryConfig, Snapshot};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::engine::{CycleError, Engine, RotationReport};

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub cycles: u64,
    pub snapshots: u64,
    pub rotations: u64,
    pub failed_cycles: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Produce,
    Settle,
}

bk_core::simple_display! {
    Step {
        Produce => "snapshot",
        Settle => "rotation",
    }
}

enum StepOutput {
    Produced(Snapshot),
    Settled(Option<RotationReport>),
}

pub struct Scheduler<T: BackupTools, C: Clock> {
    engine: Engine<T, C>,
    interval: Duration,
    retry: RetryConfig,
    shutdown: CancellationToken,
    max_cycles: Option<u64>,
    summary: SchedulerSummary,
}

impl<T: BackupTools, C: Clock> Scheduler<T, C> {
    pub fn new(
        engine: Engine<T, C>,
        interval: Duration,
        retry: RetryConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self { engine, interval, retry, shutdown, max_cycles: None, summary: Default::default() }
    }

    /// Stop after `max_cycles` cycles; `None` runs until shutdown.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Run until shutdown (or the cycle limit). Returns `Err` only for
    /// fatal errors; per-cycle failures are logged and skipped.
    pub async fn run(mut self) -> Result<SchedulerSummary, CycleError> {
        // A tracker recovered at or over the threshold rotates before the first cycle.
        if self.engine.tracker().count() >= self.engine.config().archive_after_x {
            info!(count = self.engine.tracker().count(), "pending rotation from previous run");
            self.settle().await?;
        }

        while !self.shutdown.is_cancelled() {
            self.summary.cycles += 1;
            let cycle = self.summary.cycles;
            info!(cycle, "backup cycle starting");

            match self.attempt(Step::Produce).await? {
                Some(StepOutput::Produced(snapshot)) => {
                    self.engine.record(snapshot)?;
                    self.summary.snapshots += 1;
                    self.settle().await?;
                }
                _ => self.summary.failed_cycles += 1,
            }
            info!(cycle, tracked = self.engine.tracker().count(), "backup cycle finished");

            if self.max_cycles.is_some_and(|max| cycle >= max) {
                info!(cycle, "cycle limit reached");
                break;
            }
            if !self.pause(self.interval).await {
                break;
            }
        }

        info!(
            cycles = self.summary.cycles,
            snapshots = self.summary.snapshots,
            rotations = self.summary.rotations,
            failed = self.summary.failed_cycles,
            "scheduler stopped"
        );
        Ok(self.summary)
    }

    async fn settle(&mut self) -> Result<(), CycleError> {
        if let Some(StepOutput::Settled(Some(_))) = self.attempt(Step::Settle).await? {
            self.summary.rotations += 1;
        }
        Ok(())
    }

    /// Run `step`, retrying non-fatal failures with backoff.
    ///
    /// `Ok(None)` means the step was given up on (attempts exhausted or shutdown).
    async fn attempt(&mut self, step: Step) -> Result<Option<StepOutput>, CycleError> {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let result = match step {
                Step::Produce => self.engine.produce().await.map(StepOutput::Produced),
                Step::Settle => self.engine.settle().await.map(StepOutput::Settled),
            };
            match result {
                Ok(output) => return Ok(Some(output)),
                Err(e) if e.is_fatal() => {
                    error!(step = %step, error = %e, "fatal error");
                    return Err(e);
                }
                Err(e) if attempt == max_attempts => {
                    error!(step = %step, attempts = attempt, error = %e, "giving up");
                }
                Err(e) => {
                    let backoff = self.retry.backoff_after(attempt);
                    warn!(step = %step, attempt, ?backoff, error = %e, "step failed, retrying");
                    if !self.pause(backoff).await {
                        return Ok(None);
                    }
                }
            }
        }
        Ok(None)
    }

    /// Sleep for `duration`; returns `false` if shutdown interrupted it.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.shutdown.cancelled() => {
                info!("shutdown requested, stopping between cycles");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
