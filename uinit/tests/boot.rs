//! End-to-end boots of the uinit binary against small plans.

use predicates::prelude::*;
use serde_json::json;
use std::time::{Duration, Instant};

mod common;

#[test]
fn test_netboot_scenario_hands_over() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/sleep", "args": ["sleep", "0.2"]},
        {"path": "/nonexistent-uinit/missing-binary"},
        {"path": "/bin/true", "background": true},
        {"path": "/bin/echo", "args": ["echo", "real-init"], "exec": true},
    ]));

    let output = ctx.uinit(&plan).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr:\n{}", stderr);
    assert_eq!(stdout, "real-init\n");

    assert!(
        stderr.lines().next().unwrap_or_default().contains("starting uinit"),
        "start banner is not the first line:\n{}",
        stderr
    );
    let start = common::position(&stderr, "starting uinit");
    let first = common::position(&stderr, "step 1/4: /bin/sleep");
    let skip = common::position(&stderr, "skipping step");
    let third = common::position(&stderr, "step 3/4: /bin/true");
    let fourth = common::position(&stderr, "step 4/4: /bin/echo");
    assert!(start < first && first < skip && skip < third && third < fourth);
    assert!(!stderr.contains("step 2/4"));

    // Image replaced: uinit never reaches its end banner
    assert!(!stderr.contains("uinit exit"));

    let capture = ctx.io_dir().join("2");
    let mut names: Vec<String> = std::fs::read_dir(&capture)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["cmd", "stderr", "stdin", "stdout"]);
    assert_eq!(std::fs::read_to_string(capture.join("cmd")).unwrap(), "/bin/true");

    let captured: Vec<_> = std::fs::read_dir(ctx.io_dir()).unwrap().collect();
    assert_eq!(captured.len(), 1);
}

#[test]
fn test_missing_exec_target_falls_through() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/true"},
        {"path": "/nonexistent-uinit/init", "exec": true},
    ]));

    ctx.uinit(&plan)
        .assert()
        .success()
        .stderr(predicate::str::contains("step 1/2: /bin/true"))
        .stderr(predicate::str::contains("step 2/2").not())
        .stderr(predicate::str::contains("uinit exit"));
}

#[test]
fn test_failed_exec_is_logged_then_falls_through() {
    let ctx = common::TestContext::new();
    let init = ctx.path("init");
    std::fs::write(&init, "not a program").unwrap();
    let plan = ctx.write_plan(json!([
        {"path": init, "args": ["init"], "exec": true},
    ]));

    ctx.uinit(&plan)
        .assert()
        .success()
        .stderr(predicate::str::contains("step 1/1"))
        .stderr(predicate::str::contains("Failed to exec"))
        .stderr(predicate::str::contains("uinit exit"));
}

#[test]
fn test_foreground_failure_is_not_fatal() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/false"},
        {"path": "/bin/true"},
    ]));

    let output = ctx.uinit(&plan).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    let failed = common::position(&stderr, "command /bin/false failed");
    let next = common::position(&stderr, "step 2/2: /bin/true");
    assert!(failed < next);
    assert!(stderr.contains("uinit exit"));
}

#[test]
fn test_background_does_not_block_next_step() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/sleep", "args": ["sleep", "5"], "background": true},
        {"path": "/bin/true"},
    ]));

    let started = Instant::now();
    let output = ctx.uinit(&plan).output().unwrap();
    assert!(started.elapsed() < Duration::from_secs(4));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(common::position(&stderr, "step 1/2") < common::position(&stderr, "step 2/2"));
    assert!(ctx.io_dir().join("0").join("stdout").exists());
}

#[test]
fn test_invalid_plan_falls_back_to_builtin() {
    let ctx = common::TestContext::new();
    let plan = ctx.path("plan.json");
    std::fs::write(&plan, r#"{"steps": [{"path": "/bin/true", "background": true, "exec": true}]}"#)
        .unwrap();

    ctx.uinit(&plan)
        .assert()
        .success()
        .stderr(predicate::str::contains("using built-in plan"))
        .stderr(predicate::str::contains("uinit exit"));
}

#[test]
fn test_kernel_parameters_are_ignored() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([{"path": "/bin/true"}]));

    ctx.uinit(&plan)
        .env("RUST_LOG", "debug")
        .arg("single")
        .assert()
        .success()
        .stderr(predicate::str::contains("ignoring kernel parameters"))
        .stderr(predicate::str::contains("step 1/1: /bin/true"));
}

#[test]
fn test_foreground_step_is_session_leader() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/sh", "args": ["sh", "-c", "cut -d' ' -f6 /proc/$$/stat; echo $$"]},
    ]));

    let output = ctx.uinit(&plan).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout.split_whitespace().collect();

    assert_eq!(ids.len(), 2, "stdout:\n{}", stdout);
    assert_eq!(ids[0], ids[1], "session id differs from pid");
}

#[test]
fn test_exec_does_not_inherit_capture_files() {
    let ctx = common::TestContext::new();
    let plan = ctx.write_plan(json!([
        {"path": "/bin/sleep", "args": ["sleep", "2"], "background": true},
        {"path": "/bin/sh", "args": ["sh", "-c", "ls -l /proc/$$/fd"], "exec": true},
    ]));

    let output = ctx.uinit(&plan).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let io_dir = ctx.io_dir();

    assert!(output.status.success());
    assert!(stdout.contains("->"), "fd listing missing:\n{}", stdout);
    assert!(
        !stdout.contains(&*io_dir.to_string_lossy()),
        "capture file survived exec:\n{}",
        stdout
    );
    assert!(io_dir.join("0").join("stdout").exists());
}
