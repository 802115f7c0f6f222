// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup specs
//!
//! Verify config loading and the environment gate run before any backup work.

use crate::prelude::*;

#[test]
#[serial]
fn help_lists_config_flag() {
    let project = Project::new(3);
    project.bkd(1).arg("--help").passes().stdout_has("--config");
}

#[test]
#[serial]
fn missing_config_file_fails() {
    let project = Project::new(3);
    std::fs::remove_file(project.path().join("config.json")).unwrap();

    project.bkd(1).fails().stderr_has("config.json");
    assert!(!project.backups().exists());
}

#[test]
#[serial]
fn explicit_config_path_is_used() {
    let project = Project::new(3);
    std::fs::rename(project.path().join("config.json"), project.path().join("prod.json")).unwrap();

    project.bkd(1).args(["--config", "prod.json"]).passes();
    assert_eq!(project.snapshot_dirs().len(), 1);
}

#[test]
#[serial]
fn threshold_below_two_is_rejected() {
    let project = Project::new(3);
    project.set("archive_after_x", 1.into());

    project.bkd(1).fails().stderr_has("archive_after_x");
    assert!(!project.backups().exists());
}

#[test]
#[serial]
fn missing_export_tool_stops_before_any_snapshot() {
    let project = Project::new(3);
    project.remove_tool(DUMP_TOOL);

    project.bkd(1).fails().stdout_has(DUMP_TOOL);

    assert!(!project.backups().exists());
    assert!(!project.path().join("archive").exists());
    assert!(project.log().contains("not found in search path"));
}

#[test]
#[serial]
fn missing_compact_tool_stops_before_any_snapshot() {
    let project = Project::new(3);
    project.remove_tool(TAR_TOOL);

    project.bkd(1).fails();
    assert!(!project.backups().exists());
}

#[test]
#[serial]
fn missing_data_dir_fails() {
    let project = Project::new(3);
    std::fs::remove_dir_all(project.path().join("data")).unwrap();

    project.bkd(1).fails().stdout_has("data directory");
    assert!(!project.backups().exists());
}

#[test]
#[serial]
fn roots_are_created_when_absent() {
    let project = Project::new(3);
    project.config(|doc| {
        doc["backups_path"] = format!("{}/nested/backups", project.path().display()).into();
    });

    project.bkd(1).passes();
    assert!(project.path().join("nested/backups").is_dir());
    assert!(project.path().join("archive").is_dir());
}
