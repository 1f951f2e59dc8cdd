use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn friendtracker(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_friendtracker"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("FRIENDTRACKER_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_failure_exits_with_status_one() {
    let dir = tempdir().unwrap();
    let out = friendtracker(dir.path(), &["remove", "a"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert_eq!(
        String::from_utf8(out.stderr).unwrap(),
        "error: removing friends is not supported\n"
    );
}

#[test]
fn test_bad_date_is_reported() {
    let dir = tempdir().unwrap();
    let out = friendtracker(dir.path(), &["hangout", "someday soon", "lunch", "a"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8(out.stderr).unwrap().starts_with("error: could not understand date"));
}

#[test]
fn test_commands_share_the_data_dir() {
    let dir = tempdir().unwrap();
    assert!(friendtracker(dir.path(), &["update", "a", "7"]).status.success());
    assert!(friendtracker(dir.path(), &["hangout", "today", "lunch", "a"]).status.success());
    assert!(dir.path().join("events.jsonl").is_file());

    let out = friendtracker(dir.path(), &["calendar", "--friend", "a"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("Past:\n"));
    assert!(stdout.contains(": lunch\n\t\ta\n"));
    assert!(stdout.contains("Upcoming:\n"));
}

#[test]
fn test_no_command_prints_help() {
    let dir = tempdir().unwrap();
    let out = friendtracker(dir.path(), &[]);
    assert!(out.status.success());
    assert!(String::from_utf8(out.stdout).unwrap().contains("Usage"));
    assert!(!dir.path().join("events.jsonl").exists());
}
