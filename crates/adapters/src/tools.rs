// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External backup collaborators: data-store export, tree copy, compaction.

use crate::subprocess::{display_command, run_with_timeout, SubprocessError};
use async_trait::async_trait;
use bk_core::{DbConfig, ToolPrograms};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Which collaborator a call or error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Export,
    Copy,
    Compact,
}

bk_core::simple_display! {
    ToolKind {
        Export => "export",
        Copy => "copy",
        Compact => "compact",
    }
}

/// Errors from external tool invocations
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{kind} tool `{program}` could not be launched: {source}")]
    Spawn {
        kind: ToolKind,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} tool `{program}` failed (exit {code}): {stderr}")]
    Failed { kind: ToolKind, program: String, code: i32, stderr: String },

    #[error("{kind} tool `{program}` timed out after {timeout:?}")]
    TimedOut { kind: ToolKind, program: String, timeout: Duration },

    #[error("{kind}: cannot open {path}: {source}")]
    Io {
        kind: ToolKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Spawn { kind, .. }
            | Self::Failed { kind, .. }
            | Self::TimedOut { kind, .. }
            | Self::Io { kind, .. } => *kind,
        }
    }
}

/// Adapter over the three external tools a backup cycle needs
#[async_trait]
pub trait BackupTools: Clone + Send + Sync + 'static {
    /// Export the database, writing the textual dump to `dump_path`.
    async fn export(&self, db: &DbConfig, dump_path: &Path) -> Result<(), ToolError>;

    /// Copy the *contents* of `source` into `dest`, preserving metadata.
    async fn copy_tree(&self, source: &Path, dest: &Path) -> Result<(), ToolError>;

    /// Compact `entries` (names relative to `base`) into a single `archive`.
    async fn compact(&self, archive: &Path, base: &Path, entries: &[String])
        -> Result<(), ToolError>;
}

/// Runs the configured programs as child processes.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    programs: ToolPrograms,
    timeout: Option<Duration>,
}

impl ExternalTools {
    pub fn new(programs: ToolPrograms, timeout: Option<Duration>) -> Self {
        Self { programs, timeout }
    }

    fn program(&self, kind: ToolKind) -> &str {
        match kind {
            ToolKind::Export => &self.programs.export,
            ToolKind::Copy => &self.programs.copy,
            ToolKind::Compact => &self.programs.compact,
        }
    }

    /// Spawn, wait, and map the exit status; logs the command line and outcome.
    async fn run(
        &self,
        kind: ToolKind,
        args: Vec<OsString>,
        redact: &[usize],
        stdout: Option<Stdio>,
    ) -> Result<Output, ToolError> {
        let program = self.program(kind).to_string();
        let line = display_command(&program, &args, redact);
        tracing::info!(tool = %kind, command = %line, "running command");

        let mut cmd = Command::new(&program);
        cmd.args(&args).stdin(Stdio::null());
        if let Some(stdout) = stdout {
            cmd.stdout(stdout);
        }

        let output = run_with_timeout(cmd, self.timeout, &line).await.map_err(|e| match e {
            SubprocessError::Spawn { source, .. } => {
                ToolError::Spawn { kind, program: program.clone(), source }
            }
            SubprocessError::TimedOut { timeout, .. } => {
                ToolError::TimedOut { kind, program: program.clone(), timeout }
            }
        })?;

        let stdout_text = String::from_utf8_lossy(&output.stdout);
        if !stdout_text.trim().is_empty() {
            tracing::info!(tool = %kind, stdout = %stdout_text.trim_end(), "command stdout");
        }
        let stderr_text = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr_text.is_empty() {
            tracing::warn!(tool = %kind, stderr = %stderr_text, "command stderr");
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            tracing::error!(tool = %kind, command = %line, exit = code, "command failed");
            return Err(ToolError::Failed { kind, program, code, stderr: stderr_text });
        }
        tracing::info!(tool = %kind, "command succeeded");
        Ok(output)
    }
}

/// Append a trailing separator so the copy tool transfers directory contents.
fn contents_of(dir: &Path) -> OsString {
    let mut path = dir.as_os_str().to_os_string();
    if !path.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
        path.push(std::path::MAIN_SEPARATOR_STR);
    }
    path
}

#[async_trait]
impl BackupTools for ExternalTools {
    async fn export(&self, db: &DbConfig, dump_path: &Path) -> Result<(), ToolError> {
        let file = std::fs::File::create(dump_path).map_err(|source| ToolError::Io {
            kind: ToolKind::Export,
            path: dump_path.to_path_buf(),
            source,
        })?;
        let args: Vec<OsString> = vec![
            "-u".into(),
            db.user.clone().into(),
            format!("-p{}", db.password).into(),
            db.name.clone().into(),
        ];
        self.run(ToolKind::Export, args, &[2], Some(Stdio::from(file))).await?;
        Ok(())
    }

    async fn copy_tree(&self, source: &Path, dest: &Path) -> Result<(), ToolError> {
        let args = vec!["-a".into(), contents_of(source), contents_of(dest)];
        self.run(ToolKind::Copy, args, &[], None).await?;
        Ok(())
    }

    async fn compact(
        &self,
        archive: &Path,
        base: &Path,
        entries: &[String],
    ) -> Result<(), ToolError> {
        let mut args: Vec<OsString> =
            vec!["-czf".into(), archive.into(), "-C".into(), base.into()];
        args.extend(entries.iter().map(OsString::from));
        self.run(ToolKind::Compact, args, &[], None).await?;
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{BackupTools, ToolError, ToolKind};
    use async_trait::async_trait;
    use bk_core::DbConfig;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded tool invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ToolCall {
        Export { db: String, dump_path: PathBuf },
        Copy { source: PathBuf, dest: PathBuf },
        Compact { archive: PathBuf, base: PathBuf, entries: Vec<String> },
    }

    impl ToolCall {
        pub fn kind(&self) -> ToolKind {
            match self {
                Self::Export { .. } => ToolKind::Export,
                Self::Copy { .. } => ToolKind::Copy,
                Self::Compact { .. } => ToolKind::Compact,
            }
        }
    }

    #[derive(Default)]
    struct FakeToolsState {
        calls: Vec<ToolCall>,
        failures: HashMap<ToolKind, u32>,
    }

    /// Fake tools for testing.
    ///
    /// Writes small marker files where the real tools would write output so
    /// callers can inspect the resulting tree.
    #[derive(Clone, Default)]
    pub struct FakeTools {
        inner: Arc<Mutex<FakeToolsState>>,
    }

    impl FakeTools {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make the next `times` invocations of `kind` exit non-zero.
        pub fn fail_next(&self, kind: ToolKind, times: u32) {
            *self.inner.lock().failures.entry(kind).or_default() += times;
        }

        /// Get all recorded invocations
        pub fn calls(&self) -> Vec<ToolCall> {
            self.inner.lock().calls.clone()
        }

        pub fn calls_of(&self, kind: ToolKind) -> Vec<ToolCall> {
            self.calls().into_iter().filter(|c| c.kind() == kind).collect()
        }

        fn record(&self, call: ToolCall) -> Result<(), ToolError> {
            let kind = call.kind();
            let mut state = self.inner.lock();
            state.calls.push(call);
            match state.failures.get_mut(&kind) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    Err(ToolError::Failed {
                        kind,
                        program: format!("fake-{kind}"),
                        code: 1,
                        stderr: "injected failure".to_string(),
                    })
                }
                _ => Ok(()),
            }
        }
    }

    fn write(kind: ToolKind, path: &Path, contents: String) -> Result<(), ToolError> {
        std::fs::write(path, contents).map_err(|source| ToolError::Io {
            kind,
            path: path.to_path_buf(),
            source,
        })
    }

    #[async_trait]
    impl BackupTools for FakeTools {
        async fn export(&self, db: &DbConfig, dump_path: &Path) -> Result<(), ToolError> {
            // The real export opens the dump file before the tool runs.
            write(ToolKind::Export, dump_path, String::new())?;
            self.record(ToolCall::Export {
                db: db.name.clone(),
                dump_path: dump_path.to_path_buf(),
            })?;
            write(ToolKind::Export, dump_path, format!("-- dump of {}\n", db.name))
        }

        async fn copy_tree(&self, source: &Path, dest: &Path) -> Result<(), ToolError> {
            self.record(ToolCall::Copy { source: source.to_path_buf(), dest: dest.to_path_buf() })?;
            write(ToolKind::Copy, &dest.join("data.txt"), format!("{}\n", source.display()))
        }

        async fn compact(
            &self,
            archive: &Path,
            base: &Path,
            entries: &[String],
        ) -> Result<(), ToolError> {
            // The real compactor creates the archive before reading entries.
            write(ToolKind::Compact, archive, String::new())?;
            self.record(ToolCall::Compact {
                archive: archive.to_path_buf(),
                base: base.to_path_buf(),
                entries: entries.to_vec(),
            })?;
            write(ToolKind::Compact, archive, entries.join("\n"))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTools, ToolCall};

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
