// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal specs
//!
//! Verify a long-running daemon stops cleanly between cycles.

use crate::prelude::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{Child, ExitStatus};

fn signal(child: &Child, sig: Signal) {
    kill(Pid::from_raw(child.id() as i32), sig).unwrap();
}

fn wait_exit(child: &mut Child) -> Option<ExitStatus> {
    let mut status = None;
    wait_for(SPEC_WAIT_MAX_MS, || {
        status = child.try_wait().unwrap();
        status.is_some()
    });
    status
}

#[test]
#[serial]
fn sigterm_interrupts_sleep_and_exits_cleanly() {
    let project = Project::new(3);
    let mut child = project.spawn_bkd();

    let first_cycle = wait_for(SPEC_WAIT_MAX_MS, || project.tracked().len() == 1);
    assert!(first_cycle, "first cycle should complete");

    signal(&child, Signal::SIGTERM);
    let status = wait_exit(&mut child).expect("daemon should exit after SIGTERM");

    assert!(status.success(), "unexpected exit: {status}");
    assert_eq!(project.snapshot_dirs().len(), 1);
    assert!(!project.backups().join(".bk.lock").exists());
    assert!(project.log().contains("shutdown requested"));
}

#[test]
#[serial]
fn sigint_is_handled_like_sigterm() {
    let project = Project::new(3);
    let mut child = project.spawn_bkd();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || project.tracked().len() == 1));

    signal(&child, Signal::SIGINT);
    let status = wait_exit(&mut child).expect("daemon should exit after SIGINT");

    assert!(status.success(), "unexpected exit: {status}");
}

#[test]
#[serial]
fn second_daemon_on_same_root_is_refused() {
    let project = Project::new(3);
    let mut first = project.spawn_bkd();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || project.tracked().len() == 1));

    project.bkd(1).fails().stdout_has("already running");
    assert_eq!(project.snapshot_dirs().len(), 1);

    signal(&first, Signal::SIGTERM);
    assert!(wait_exit(&mut first).is_some_and(|s| s.success()));
}
