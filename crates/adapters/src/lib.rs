// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the external tools a backup cycle drives

pub mod lookup;
pub mod subprocess;
pub mod tools;

pub use lookup::find_in;
pub use tools::{BackupTools, ExternalTools, ToolError, ToolKind};

#[cfg(any(test, feature = "test-support"))]
pub use tools::{FakeTools, ToolCall};
