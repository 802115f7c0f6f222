// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bk-core: configuration, snapshot identity, and the retention state machine

pub mod macros;

pub mod clock;
pub mod config;
pub mod rotation;
pub mod snapshot;
pub mod tracker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, DbConfig, RetryConfig, ToolPrograms, MIN_THRESHOLD};
pub use rotation::{
    archive_labels, Decision, Phase, PolicyError, RotationPlan, RotationPolicy,
    ARCHIVE_EXTENSION,
};
pub use snapshot::{Snapshot, SnapshotLabel};
pub use tracker::RetentionTracker;
