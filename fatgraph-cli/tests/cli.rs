//! Tests for the CLI
//!
//! Miri is globally disabled for these tests because they mostly involve
//! calling the CLI binary, which Miri doesn't support.
#![cfg(all(test, not(miri)))]

use assert_cmd::Command;
use assert_fs::{NamedTempFile, fixture::FileWriteStr};
use predicates::{prelude::*, str::contains};
use rstest::{fixture, rstest};
use serde_json::Value;

#[fixture]
fn cmd() -> Command {
    Command::cargo_bin("fatgraph").unwrap()
}

#[fixture]
fn script_string() -> String {
    r#"{
        "initial": 1,
        "ops": [
            {"op": "insert_root", "value": 10, "version": 1},
            {"op": "insert_vertex", "value": 2, "parent": 1, "slot": 0},
            {"op": "insert_root", "value": 20, "version": 5},
            {"op": "insert_value", "value": 3, "node": 2}
        ]
    }"#
    .to_string()
}

#[fixture]
fn script_file(script_string: String) -> NamedTempFile {
    let file = NamedTempFile::new("script.json").unwrap();
    file.write_str(&script_string).unwrap();
    file
}

fn report(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[rstest]
fn test_demo(mut cmd: Command) {
    cmd.arg("demo");
    let output = cmd.assert().success().get_output().stdout.clone();
    let report = report(&output);
    assert_eq!(report["current_version"], 3);
    assert_eq!(report["live_root"], 7);
    assert_eq!(report["nodes"].as_array().unwrap().len(), 8);
    assert_eq!(report["steps"][8]["result"]["status"], "write");
    assert_eq!(report["steps"][8]["result"]["outcome"]["outcome"], "copied");
    assert_eq!(report["nodes"][2]["log"][1]["value"], 22);
}

#[rstest]
fn test_demo_in_degree(mut cmd: Command) {
    cmd.args(["demo", "--in-degree", "2"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report = report(&output);
    // Logs of four entries absorb all three writes.
    assert_eq!(report["live_root"], 2);
    assert_eq!(report["nodes"].as_array().unwrap().len(), 7);
}

#[rstest]
fn test_demo_huge_in_degree(mut cmd: Command) {
    cmd.args(["demo", "--in-degree", "100000000000"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let report = report(&output);
    assert_eq!(report["nodes"][0]["log_capacity"], 200000000000u64);
    assert_eq!(report["live_root"], 2);
}

#[rstest]
fn test_demo_print_script(mut cmd: Command) {
    cmd.args(["demo", "--print-script"]);
    let output = cmd.assert().success().get_output().stdout.clone();
    let script = report(&output);
    assert_eq!(script["initial"], 1);
    assert_eq!(script["ops"][0]["op"], "insert_root");
    assert_eq!(script["config"]["root_back_fill"], "retroactive");
}

#[rstest]
fn test_run(script_file: NamedTempFile, mut cmd: Command) {
    cmd.arg("run").arg(script_file.path());
    let output = cmd
        .assert()
        .success()
        .stderr(contains("operation rejected"))
        .get_output()
        .stdout
        .clone();
    let report = report(&output);
    assert_eq!(report["steps"][2]["result"]["status"], "failed");
    assert_eq!(report["steps"][3]["result"]["outcome"]["outcome"], "logged");
    assert_eq!(report["versions"].as_array().unwrap().len(), 2);
    // The initial root was back-filled.
    assert_eq!(report["nodes"][0]["out_edges"][0], 2);
}

#[rstest]
fn test_run_stdin_quiet(script_string: String, mut cmd: Command) {
    cmd.args(["run", "-", "-q"]);
    cmd.write_stdin(script_string);
    cmd.assert()
        .success()
        .stderr(contains("operation rejected").not());
}

#[rstest]
fn test_run_strict_roots(script_file: NamedTempFile, mut cmd: Command) {
    cmd.arg("run").arg(script_file.path()).arg("--strict-roots");
    let output = cmd.assert().success().get_output().stdout.clone();
    let report = report(&output);
    assert_eq!(report["nodes"][0]["out_edges"][0], Value::Null);
}

#[rstest]
fn test_run_fail_fast(script_file: NamedTempFile, mut cmd: Command) {
    cmd.arg("run").arg(script_file.path()).arg("--fail-fast");
    cmd.assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(contains("Step 2 failed"));
}

#[rstest]
fn test_run_output_file(script_file: NamedTempFile, mut cmd: Command) {
    let output = NamedTempFile::new("report.json").unwrap();
    cmd.arg("run")
        .arg(script_file.path())
        .arg("--pretty")
        .arg("-o")
        .arg(output.path());
    cmd.assert().success();
    let report: Value = serde_json::from_str(&std::fs::read_to_string(output.path()).unwrap())
        .unwrap();
    assert_eq!(report["current_version"], 1);
}

#[rstest]
fn test_doesnt_exist(mut cmd: Command) {
    cmd.args(["run", "foobar"]);
    cmd.assert()
        .failure()
        .stderr(contains("No such file or directory"));
}

#[rstest]
fn test_bad_script(mut cmd: Command) {
    cmd.arg("run");
    cmd.write_stdin(r#"{"ops": []}"#);
    cmd.assert()
        .failure()
        .stderr(contains("Error parsing input"));
}
