//! Integration tests for the `prtgly` binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and the preview pipeline over CSV imports -- all without a PRTG server.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `prtgly` binary with env isolation.
///
/// Clears every variable the CLI reads and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn prtgly_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("prtgly");
    cmd.env("HOME", "/tmp/prtgly-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/prtgly-cli-test-nonexistent")
        .env_remove("PRTGLY_PROFILE")
        .env_remove("PRTGLY_FORMAT")
        .env_remove("PRTGLY_INSECURE")
        .env_remove("PRTGLY_TIMEOUT")
        .env_remove("PRTGENDPOINT")
        .env_remove("PRTGUSERNAME")
        .env_remove("PRTGPASSWORD")
        .env_remove("PRTGPASSHASH")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

const ENTITIES: &str = "\
type,objid,parentid,name,tags,host
Group,1,,NET,core,
Device,2,1,SW1,edge,10.0.0.1
Device,3,1,RTR1,,10.0.0.254
";

const RULES: &str = r#"
rules:
  - name: "SW*"
    prop: tags
    value: [core, mgmt]
    update: true
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = prtgly_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    prtgly_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("PRTG")
            .and(predicate::str::contains("preview"))
            .and(predicate::str::contains("preview-changed-only"))
            .and(predicate::str::contains("apply")),
    );
}

#[test]
fn test_version_flag() {
    prtgly_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("prtgly"));
}

#[test]
fn test_invalid_format_is_usage_error() {
    prtgly_cmd()
        .args(["ls", "--format", "xml"])
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    prtgly_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Import + preview ────────────────────────────────────────────────

#[test]
fn test_ls_from_source_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);

    prtgly_cmd()
        .args(["ls", "--format", "csv", "--source-file"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("host,name,objid,parentid,tags,type"))
        .stdout(predicate::str::contains("10.0.0.1,SW1,2,1,edge,device"));
}

#[test]
fn test_preview_reconciles_imported_entities() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);
    let rules = write(dir.path(), "rules.yaml", RULES);

    let output = prtgly_cmd()
        .args(["preview", "--format", "csv", "--show-queries", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    insta::assert_snapshot!(stdout.trim_end(), @r"
    setobjectproperty.htm?id=2&name=tags&value=edge+mgmt
    host,name,objid,parentid,tags,type
    10.0.0.1,SW1,2,1,edge mgmt,device
    10.0.0.254,RTR1,3,1,,device
    ");
}

#[test]
fn test_preview_changed_only_filters_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);
    let rules = write(dir.path(), "rules.yaml", RULES);

    prtgly_cmd()
        .args(["preview-changed-only", "--format", "csv", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("SW1"))
        .stdout(predicate::str::contains("RTR1").not());
}

#[test]
fn test_preview_sorted_pretty_table() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);
    let rules = write(dir.path(), "rules.yaml", RULES);

    let output = prtgly_cmd()
        .args(["preview", "--sort-by", "name", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let rtr = stdout.find("RTR1").unwrap();
    let sw = stdout.find("SW1").unwrap();
    assert!(rtr < sw, "{stdout}");
}

// ── Failure modes ───────────────────────────────────────────────────

#[test]
fn test_apply_from_source_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);
    let rules = write(dir.path(), "rules.yaml", RULES);

    let output = prtgly_cmd()
        .args(["apply", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("imported file"), "{text}");
}

#[test]
fn test_malformed_rule_fails_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "entities.csv", ENTITIES);
    let rules = write(dir.path(), "rules.yaml", "rules:\n  - name: \"SW*\"\n    value: [mgmt]\n");

    let output = prtgly_cmd()
        .args(["preview", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Rule #0"), "{text}");
}

#[test]
fn test_bad_import_row_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(
        dir.path(),
        "entities.csv",
        "type,objid,name\nDevice,2,SW1\nRouter,3,R1\n",
    );
    let rules = write(dir.path(), "rules.yaml", RULES);

    let output = prtgly_cmd()
        .args(["preview", "--source-file"])
        .arg(&source)
        .arg("--rules")
        .arg(&rules)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("line 3"), "{text}");
}

#[test]
fn test_unknown_profile_is_usage_error() {
    prtgly_cmd()
        .args(["status", "--profile", "nope"])
        .assert()
        .code(2);
}
