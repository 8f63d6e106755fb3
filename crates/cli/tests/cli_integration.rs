use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const MAKE_GRAMMAR: &str = r#"{
    "format-version": 1,
    "command": {
        "name": "make",
        "arguments": [{ "name": "file" }],
        "options": [
            { "name": "v", "aliases": ["verbose"] },
            { "name": "jobs", "aliases": ["j"], "usage": "single-parameter",
              "value-type": "integer",
              "validators": [{ "kind": "integer", "min": 1, "max": 16 }] }
        ],
        "commands": [{ "name": "clean" }]
    }
}"#;

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argsmith-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_grammar(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("grammar.json");
    fs::write(&path, text).expect("failed to write grammar");
    path
}

fn argsmith() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argsmith"))
}

fn parse_with(grammar: &Path, extra: &[&str], tokens: &[&str]) -> Output {
    argsmith()
        .arg("parse")
        .arg("--grammar")
        .arg(grammar)
        .args(extra)
        .arg("--")
        .args(tokens)
        .output()
        .expect("failed to run argsmith parse")
}

fn assert_success(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
}

#[test]
fn help_works() {
    let out = argsmith()
        .arg("--help")
        .output()
        .expect("failed to run argsmith --help");
    assert_success(&out, "argsmith --help");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("argsmith") && stdout.contains("check") && stdout.contains("parse"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn check_summarizes_a_valid_grammar() {
    let dir = make_temp_dir("check-ok");
    let grammar = write_grammar(&dir, MAKE_GRAMMAR);

    let out = argsmith()
        .arg("check")
        .arg("--grammar")
        .arg(&grammar)
        .arg("--json")
        .output()
        .expect("failed to run argsmith check");
    assert_success(&out, "argsmith check");

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("check output is not JSON");
    assert_eq!(report["command"], "make");
    assert_eq!(report["style"], "unix");
    assert_eq!(report["commands"], serde_json::json!(["make", "make clean"]));
    assert_eq!(report["arguments"], 1);
    assert_eq!(report["options"], 2);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_rejects_required_after_optional() {
    let dir = make_temp_dir("check-bad");
    let grammar = write_grammar(
        &dir,
        r#"{"command": {"name": "x", "arguments": [
            {"name": "a", "optional": true}, {"name": "b"}]}}"#,
    );

    let out = argsmith()
        .arg("check")
        .arg("--grammar")
        .arg(&grammar)
        .output()
        .expect("failed to run argsmith check");
    assert!(!out.status.success(), "check accepted a bad grammar");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("declared after optional argument 'a'"),
        "unexpected stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_reports_a_missing_file() {
    let dir = make_temp_dir("check-missing");

    let out = argsmith()
        .arg("check")
        .arg("--grammar")
        .arg(dir.join("nope.json"))
        .output()
        .expect("failed to run argsmith check");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("failed to read grammar"), "unexpected stderr:\n{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_prints_the_report() {
    let dir = make_temp_dir("parse-ok");
    let grammar = write_grammar(&dir, MAKE_GRAMMAR);

    let out = parse_with(&grammar, &[], &["build.txt", "-v", "-j", "4"]);
    assert_success(&out, "argsmith parse");

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse output is not JSON");
    assert_eq!(
        report,
        serde_json::json!({
            "command": ["make"],
            "groups": [0],
            "arguments": { "file": "build.txt" },
            "options": {
                "v": { "occurrences": 1, "value": true },
                "jobs": { "occurrences": 1, "value": 4 }
            }
        })
    );

    let out = parse_with(&grammar, &[], &["clean"]);
    assert_success(&out, "argsmith parse clean");
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["command"], serde_json::json!(["make", "clean"]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_errors_exit_with_their_code() {
    let dir = make_temp_dir("parse-err");
    let grammar = write_grammar(&dir, MAKE_GRAMMAR);

    let out = parse_with(&grammar, &[], &["build.txt", "--nope"]);
    assert_eq!(out.status.code(), Some(1), "unknown option should exit 1");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown option '--nope'"), "unexpected stderr:\n{stderr}");
    assert!(out.stdout.is_empty());

    let out = parse_with(&grammar, &[], &["build.txt", "--jobs=99"]);
    assert_eq!(out.status.code(), Some(12), "validation failure should exit 12");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("99"), "unexpected stderr:\n{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn style_can_be_overridden() {
    let dir = make_temp_dir("parse-style");
    let grammar = write_grammar(&dir, MAKE_GRAMMAR);

    let out = parse_with(&grammar, &["--style", "windows"], &["/v", "/jobs:2", "out.txt"]);
    assert_success(&out, "argsmith parse --style windows");
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["options"]["v"]["value"], true);
    assert_eq!(report["options"]["jobs"]["value"], 2);
    assert_eq!(report["arguments"]["file"], "out.txt");

    let out = parse_with(
        &grammar,
        &["--style", "windows", "--grouping", "options-after-arguments"],
        &["/v", "out.txt"],
    );
    assert!(!out.status.success(), "grouping override was ignored");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn help_request_is_reported() {
    let dir = make_temp_dir("parse-help");
    let grammar = write_grammar(&dir, MAKE_GRAMMAR);

    // `--help` is not declared, yet it is reported instead of failing.
    let out = parse_with(&grammar, &[], &["--help"]);
    assert_success(&out, "argsmith parse --help");
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report, serde_json::json!({ "help-requested": true }));

    // Help after `--` is just an argument.
    let out = parse_with(&grammar, &[], &["--", "-h"]);
    assert_success(&out, "argsmith parse -- -h");
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["arguments"]["file"], "-h");
    assert!(report.get("help-requested").is_none());

    let _ = fs::remove_dir_all(&dir);
}
