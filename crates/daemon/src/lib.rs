// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup daemon library
//!
//! The `bkd` binary wires these pieces together: load config, start logging,
//! pass the startup gate, then hand the engine to the scheduler.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod engine;
pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod scheduler;

pub use engine::{CycleError, CycleReport, Engine, RotationReport};
pub use lifecycle::{DaemonState, LifecycleError, StartupResult};
pub use scheduler::{Scheduler, SchedulerSummary};
