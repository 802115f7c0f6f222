// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

pub use serial_test::serial;
pub use std::path::{Path, PathBuf};
pub use std::time::Duration;

use std::os::unix::fs::PermissionsExt;
use std::process::Output;
use std::time::Instant;
use tempfile::TempDir;

/// Upper bound for polling a running daemon.
pub const SPEC_WAIT_MAX_MS: u64 = 10_000;

pub const DUMP_TOOL: &str = "bk-spec-dump";
pub const COPY_TOOL: &str = "bk-spec-copy";
pub const TAR_TOOL: &str = "bk-spec-tar";

const DUMP_SCRIPT: &str = r#"echo "-- dump $*""#;
// rsync -a <src>/ <dst>/
const COPY_SCRIPT: &str = r#"cp -R "$2." "$3""#;
// tar -czf <archive> -C <base> <entries>...; records the entry list
const TAR_SCRIPT: &str = r#"archive="$2"
base="$4"
shift 4
cd "$base" && ls -d "$@" > "$archive""#;

/// A temp project: data dir, fake tools in `bin/`, `config.json`.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new(threshold: usize) -> Self {
        let project = Self { dir: tempfile::tempdir().unwrap() };
        project.file("data/orders.csv", "1,widget\n");
        project.tool(DUMP_TOOL, DUMP_SCRIPT);
        project.tool(COPY_TOOL, COPY_SCRIPT);
        project.tool(TAR_TOOL, TAR_SCRIPT);
        project.config(|doc| doc["archive_after_x"] = threshold.into());
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Install (or replace) an executable shell script in `bin/`.
    pub fn tool(&self, name: &str, body: &str) {
        let rel = format!("bin/{name}");
        self.file(&rel, &format!("#!/bin/sh\n{body}\n"));
        let perms = std::fs::Permissions::from_mode(0o755);
        std::fs::set_permissions(self.path().join(rel), perms).unwrap();
    }

    pub fn remove_tool(&self, name: &str) {
        std::fs::remove_file(self.path().join("bin").join(name)).unwrap();
    }

    /// Rewrite `config.json` starting from the default document.
    pub fn config(&self, edit: impl FnOnce(&mut serde_json::Value)) {
        let root = self.path().display().to_string();
        let mut doc = serde_json::json!({
            "db": { "name": "shop", "user": "backup", "password": "s3cret" },
            "log_file_path": format!("{root}/logs/bk.log"),
            "data_path": format!("{root}/data"),
            "backups_path": format!("{root}/backups"),
            "archive_path": format!("{root}/archive"),
            "every_x_days": 1,
            "archive_after_x": 3,
            "tools": { "export": DUMP_TOOL, "copy": COPY_TOOL, "compact": TAR_TOOL },
            "retry": { "max_attempts": 1, "backoff_secs": 0 }
        });
        edit(&mut doc);
        self.file("config.json", &doc.to_string());
    }

    /// Change one top-level field of the current `config.json`.
    pub fn set(&self, field: &str, value: serde_json::Value) {
        let path = self.path().join("config.json");
        let mut doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        doc[field] = value;
        self.file("config.json", &doc.to_string());
    }

    fn search_path(&self) -> String {
        format!("{}:/usr/bin:/bin", self.path().join("bin").display())
    }

    fn prepare(&self, cmd: &mut std::process::Command) {
        cmd.current_dir(self.path())
            .env("PATH", self.search_path())
            .env("BK_INTERVAL_MS", "0")
            .env_remove("BK_LOG")
            .env_remove("BK_MAX_CYCLES");
    }

    /// `bkd` running `cycles` cycles back to back, then exiting.
    pub fn bkd(&self, cycles: u64) -> assert_cmd::Command {
        let mut std_cmd = std::process::Command::new(env!("CARGO_BIN_EXE_bkd"));
        self.prepare(&mut std_cmd);
        std_cmd.env("BK_MAX_CYCLES", cycles.to_string());
        let mut cmd = assert_cmd::Command::from_std(std_cmd);
        cmd.timeout(Duration::from_secs(30));
        cmd
    }

    /// `bkd` in the background with a long interval, for signal specs.
    pub fn spawn_bkd(&self) -> std::process::Child {
        let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_bkd"));
        self.prepare(&mut cmd);
        cmd.env("BK_INTERVAL_MS", "600000")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null());
        cmd.spawn().unwrap()
    }

    pub fn backups(&self) -> PathBuf {
        self.path().join("backups")
    }

    pub fn snapshot_dirs(&self) -> Vec<String> {
        names(&self.backups(), |p| p.is_dir())
    }

    pub fn archives(&self) -> Vec<String> {
        names(&self.path().join("archive"), |p| p.is_file())
    }

    pub fn archive(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join("archive").join(name)).unwrap()
    }

    /// Labels in the persisted tracker, empty if none was written yet.
    pub fn tracked(&self) -> Vec<String> {
        let Ok(raw) = std::fs::read_to_string(self.backups().join(".bk-tracker.json")) else {
            return Vec::new();
        };
        let Ok(doc) = serde_json::from_str::<serde_json::Value>(&raw) else {
            return Vec::new();
        };
        doc["snapshots"]
            .as_array()
            .map(|items| {
                items.iter().filter_map(|s| s["label"].as_str().map(str::to_string)).collect()
            })
            .unwrap_or_default()
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(self.path().join("logs/bk.log")).unwrap_or_default()
    }
}

fn names(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|rd| {
            rd.flatten()
                .map(|e| e.path())
                .filter(|p| keep(p))
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Assertions on a finished `bkd` run.
pub trait Run {
    fn passes(&mut self) -> Outcome;
    fn fails(&mut self) -> Outcome;
}

impl Run for assert_cmd::Command {
    fn passes(&mut self) -> Outcome {
        let outcome = Outcome(self.output().unwrap());
        assert!(outcome.0.status.success(), "expected bkd to succeed\n{outcome}");
        outcome
    }

    fn fails(&mut self) -> Outcome {
        let outcome = Outcome(self.output().unwrap());
        assert!(!outcome.0.status.success(), "expected bkd to fail\n{outcome}");
        outcome
    }
}

pub struct Outcome(Output);

impl Outcome {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.0.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.0.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout().contains(needle), "stdout missing {needle:?}\n{self}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr().contains(needle), "stderr missing {needle:?}\n{self}");
        self
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "status: {}", self.0.status)?;
        write!(f, "stdout:\n{}\nstderr:\n{}", self.stdout(), self.stderr())
    }
}

/// Poll `check` every 20ms until it holds or `max_ms` passes.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
