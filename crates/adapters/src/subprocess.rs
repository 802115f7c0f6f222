// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running external commands to completion.

use std::ffi::OsStr;
use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{description} could not be launched: {source}")]
    Spawn {
        description: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{description} timed out after {timeout:?}")]
    TimedOut { description: String, timeout: Duration },
}

/// Run `cmd` and wait for it to exit.
///
/// Stdout and stderr are captured unless the caller already redirected them.
/// With `timeout` set, the child is killed once it expires; without one, a
/// hung child blocks the caller indefinitely.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Option<Duration>,
    description: &str,
) -> Result<Output, SubprocessError> {
    cmd.kill_on_drop(true);
    let spawn_err =
        |source| SubprocessError::Spawn { description: description.to_string(), source };

    match timeout {
        Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
            Ok(result) => result.map_err(spawn_err),
            Err(_) => Err(SubprocessError::TimedOut {
                description: description.to_string(),
                timeout: limit,
            }),
        },
        None => cmd.output().await.map_err(spawn_err),
    }
}

/// Render a command line for logs, replacing the listed arguments with `***`.
pub fn display_command<S: AsRef<OsStr>>(program: &str, args: &[S], redact: &[usize]) -> String {
    let mut line = program.to_string();
    for (i, arg) in args.iter().enumerate() {
        line.push(' ');
        if redact.contains(&i) {
            line.push_str("***");
        } else {
            line.push_str(&arg.as_ref().to_string_lossy());
        }
    }
    line
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
