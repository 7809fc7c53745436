// End-to-end tests for the tdd_runner binary: discovery, exclusion,
// failure framing, and exit behavior.
// Requires: assert_cmd, predicates, tempfile crates in [dev-dependencies]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn runner() -> Command {
    Command::cargo_bin("tdd_runner").unwrap()
}

#[test]
fn discovers_marked_files_and_keeps_running_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // The two default units: one passing, one failing.
    write(&root.join("a/should_tests.rs"), "/* TDD */\n");
    write(&root.join("a/failing_tests.rs"), "/*TDD*/\n");
    // Not opted in.
    write(&root.join("a/unmarked.rs"), "fn main() {}\n");
    // Inside an excluded dependency subtree.
    write(&root.join("a/vendor/should_tests.rs"), "/* TDD */\n");

    let assert = runner().arg(root).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert!(output.contains("Started: "));
    assert!(output.contains("rootPath: "));
    assert!(output.contains("Testing: 'a/should_tests.rs'"));
    assert!(output.contains("Testing: 'a/failing_tests.rs'"));
    assert!(output.contains("Finished: "));
    assert!(output.contains("Duration: "));

    // Exactly one framed failure, pointing into the failing unit.
    assert!(output.contains("!!!"));
    assert_eq!(output.matches("[1] value is not true").count(), 1);
    assert!(output.contains("selftest.rs"));

    // The unmarked file and the vendor subtree never appear.
    assert!(!output.contains("unmarked"));
    assert!(!output.contains("vendor"));
}

#[test]
fn a_failing_expectation_does_not_change_the_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("failing_tests.rs"), "/* TDD */\n");

    runner()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("value is not true"));
}

#[test]
fn extension_matching_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("case_probe.RS"), "/*  TDD\t*/\n");

    runner()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("Testing: 'case_probe.RS'"));
}

#[test]
fn a_marked_file_without_a_registered_unit_is_inert() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("orphan.rs"), "/* TDD */\n");

    let assert = runner().arg(dir.path()).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(output.contains("Testing: 'orphan.rs'"));
    assert!(!output.contains("!!!"));
}

#[test]
fn missing_root_argument_is_a_usage_error() {
    runner().assert().failure().stderr(contains("Usage"));
}

#[test]
fn unresolvable_root_is_a_fatal_diagnostic() {
    runner()
        .arg("/no/such/directory/anywhere")
        .assert()
        .failure()
        .stderr(contains("invalid path").and(contains("invalid_root")));
}

#[test]
fn duplicate_discovery_runs_a_unit_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(&root.join("a/failing_tests.rs"), "/* TDD */\n");
    write(&root.join("b/failing_tests.rs"), "/* TDD */\n");

    let assert = runner().arg(root).assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    // Both discoveries report, the unit executes once.
    assert_eq!(output.matches("Testing:").count(), 2);
    assert_eq!(output.matches("[1] value is not true").count(), 1);
}
