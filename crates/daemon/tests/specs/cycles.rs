// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup cycle specs
//!
//! Verify snapshot production, tracking, and rotation through the binary.

use crate::prelude::*;

/// Base label shared by every same-day snapshot in `dirs`.
fn base_label(dirs: &[String]) -> String {
    dirs[0].split('.').next().unwrap().to_string()
}

#[test]
#[serial]
fn single_cycle_writes_dump_and_data_copy() {
    let project = Project::new(3);

    project.bkd(1).passes();

    let dirs = project.snapshot_dirs();
    assert_eq!(dirs.len(), 1);
    let label = &dirs[0];
    let snapshot = project.backups().join(label);
    let dump = std::fs::read_to_string(snapshot.join(format!("shop-{label}.sql"))).unwrap();
    assert_eq!(dump, "-- dump -u backup -ps3cret shop\n");
    assert_eq!(std::fs::read_to_string(snapshot.join("orders.csv")).unwrap(), "1,widget\n");
    assert_eq!(project.tracked(), vec![label.clone()]);
}

#[test]
#[serial]
fn threshold_three_archives_first_two_and_keeps_third() {
    let project = Project::new(3);

    project.bkd(3).passes();

    let dirs = project.snapshot_dirs();
    let day = dirs[0].trim_end_matches(".2").to_string();
    assert_eq!(dirs, vec![format!("{day}.2")]);
    let archive = format!("{day}_{day}.1.tar.gz");
    assert_eq!(project.archives(), vec![archive.clone()]);
    assert_eq!(project.archive(&archive), format!("{day}\n{day}.1\n"));
    assert!(project.tracked().is_empty());
}

#[test]
#[serial]
fn threshold_two_retires_previous_snapshot_each_time() {
    let project = Project::new(2);

    project.bkd(4).passes();

    let dirs = project.snapshot_dirs();
    let day = base_label(&dirs);
    assert_eq!(dirs, vec![format!("{day}.1"), format!("{day}.3")]);
    assert_eq!(project.archives(), vec![format!("{day}.2.tar.gz"), format!("{day}.tar.gz")]);
}

#[test]
#[serial]
fn same_day_collision_is_logged() {
    let project = Project::new(5);

    project.bkd(2).passes();

    let dirs = project.snapshot_dirs();
    let day = base_label(&dirs);
    assert_eq!(dirs, vec![day.clone(), format!("{day}.1")]);
    assert!(project.log().contains("label taken today, using suffix"));
}

#[test]
#[serial]
fn copy_failure_keeps_dump_and_skips_recording() {
    let project = Project::new(3);
    project.tool(COPY_TOOL, "echo 'rsync: connection refused' >&2\nexit 23");

    project.bkd(2).passes();

    let dirs = project.snapshot_dirs();
    assert_eq!(dirs.len(), 2);
    for label in &dirs {
        assert!(project.backups().join(label).join(format!("shop-{label}.sql")).is_file());
        assert!(!project.backups().join(label).join("orders.csv").exists());
    }
    assert!(project.tracked().is_empty());
    let log = project.log();
    assert!(log.contains("connection refused"));
    assert!(log.contains("giving up"));
}

#[test]
#[serial]
fn tracker_survives_restart() {
    let project = Project::new(3);

    project.bkd(2).passes();
    assert_eq!(project.tracked().len(), 2);
    assert!(project.archives().is_empty());

    project.bkd(1).passes();
    assert_eq!(project.archives().len(), 1);
    assert_eq!(project.snapshot_dirs().len(), 1);
    assert!(project.tracked().is_empty());
}

#[test]
#[serial]
fn vanished_snapshot_is_dropped_on_restart() {
    let project = Project::new(3);

    project.bkd(2).passes();
    let dirs = project.snapshot_dirs();
    std::fs::remove_dir_all(project.backups().join(&dirs[0])).unwrap();

    project.bkd(1).passes();
    // One survivor plus one new snapshot: still below the threshold
    assert_eq!(project.tracked().len(), 2);
    assert!(project.archives().is_empty());
}

#[test]
#[serial]
fn output_goes_to_stdout_and_log_file() {
    let project = Project::new(3);
    std::fs::create_dir_all(project.path().join("logs")).unwrap();
    std::fs::write(project.path().join("logs/bk.log"), "previous run\n").unwrap();

    let outcome = project.bkd(1).passes().stdout_has("running command");

    let log = project.log();
    assert!(log.starts_with("previous run\n"));
    assert!(log.contains("running command"));
    assert!(log.contains("backup cycle finished"));
    assert!(!log.contains("s3cret"));
    assert!(!outcome.stdout().contains("s3cret"));
}

#[test]
#[serial]
fn lock_file_is_removed_on_clean_exit() {
    let project = Project::new(3);

    project.bkd(1).passes();

    assert!(!project.backups().join(".bk.lock").exists());
}
