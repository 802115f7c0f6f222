// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

/// Default log filter when `BK_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Log filter directive (`BK_LOG`, e.g. `debug` or `bk_daemon=trace`)
pub fn log_filter() -> String {
    std::env::var("BK_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Cycle interval override in milliseconds, replacing `every_x_days`
pub fn cycle_interval() -> Option<Duration> {
    std::env::var("BK_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Stop after this many cycles instead of running forever
pub fn max_cycles() -> Option<u64> {
    std::env::var("BK_MAX_CYCLES").ok().and_then(|s| s.parse::<u64>().ok()).filter(|n| *n > 0)
}
