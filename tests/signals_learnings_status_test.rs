use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn signals_cmd(workdir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ralph-signals");
    cmd.current_dir(workdir)
        .env("RALPH_SIGNALS_HOME", workdir)
        .env("RALPH_SIGNALS_CONFIG_PATH", workdir.join("signals.toml"))
        .env_remove("RALPH_SIGNALS_BUFFER_SECS")
        .env_remove("RALPH_SIGNALS_BARE_MAX_CHARS")
        .env_remove("RALPH_SIGNALS_AUDIT_ENABLED")
        .env_remove("RALPH_SIGNALS_AUDIT_LOG");
    cmd
}

#[test]
fn learnings_prints_block_body() {
    let tmp = tempdir().expect("tempdir");
    let output = tmp.path().join("impl.txt");
    fs::write(
        &output,
        "Done.\nRALPH_LEARNINGS:\n- run migrations first\n- keep fixtures small\n\nOther text\n",
    )
    .expect("write");

    signals_cmd(tmp.path())
        .arg("learnings")
        .arg(&output)
        .assert()
        .success()
        .stdout("- run migrations first\n- keep fixtures small\n");
}

#[test]
fn learnings_absent_still_succeeds_silently() {
    let tmp = tempdir().expect("tempdir");

    signals_cmd(tmp.path())
        .args(["learnings", "-"])
        .write_stdin("nothing learned\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn status_reports_effective_config_as_json() {
    let tmp = tempdir().expect("tempdir");

    let assert = signals_cmd(tmp.path())
        .env("RALPH_SIGNALS_BUFFER_SECS", "90")
        .args(["status", "--json"])
        .assert()
        .success();

    let report: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("status json");
    assert_eq!(report["command"], "status");
    assert_eq!(report["ok"], true);
    let details: Vec<&str> = report["details"]
        .as_array()
        .expect("details array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(details.contains(&"rate_limit.buffer_secs=90"));
    assert!(details.contains(&"rate_limit.bare_max_chars=500"));
    assert!(details.iter().any(|d| d.starts_with("version=")));
    assert!(
        details
            .iter()
            .any(|d| d.starts_with("env_overrides=") && d.contains("RALPH_SIGNALS_BUFFER_SECS"))
    );
}

#[test]
fn status_flags_invalid_config() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join("signals.toml"),
        "[audit]\nenabled = true\n",
    )
    .expect("write config");

    signals_cmd(tmp.path())
        .arg("status")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("status ok=false"))
        .stderr(predicate::str::contains("audit enabled"));
}

#[test]
fn invalid_config_falls_back_to_defaults_for_input_commands() {
    let tmp = tempdir().expect("tempdir");
    fs::write(
        tmp.path().join("signals.toml"),
        "[rate_limit]\nbuffer_secs = 0\n",
    )
    .expect("write config");

    let assert = signals_cmd(tmp.path())
        .args(["rate-limit", "-"])
        .write_stdin("resets 6pm (UTC)")
        .assert()
        .success()
        .stderr(predicate::str::contains("RALPH_SIGNALS_WARN code=CONFIG_INVALID"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("18:01:00 UTC"));
    assert_eq!(lines[2], "UTC");
}

#[test]
fn audit_without_log_path_does_not_drop_extracted_block() {
    let tmp = tempdir().expect("tempdir");

    signals_cmd(tmp.path())
        .env("RALPH_SIGNALS_AUDIT_ENABLED", "1")
        .args(["extract", "-", "RALPH_STATUS"])
        .write_stdin("{\"RALPH_STATUS\": 1}")
        .assert()
        .success()
        .stdout("{\"RALPH_STATUS\":1}\n")
        .stderr(predicate::str::contains("code=CONFIG_INVALID"));
}

#[test]
fn status_is_recorded_in_audit_log() {
    let tmp = tempdir().expect("tempdir");
    let audit_log = tmp.path().join("audit.jsonl");

    signals_cmd(tmp.path())
        .env("RALPH_SIGNALS_AUDIT_ENABLED", "true")
        .env("RALPH_SIGNALS_AUDIT_LOG", &audit_log)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("status ok=true"));

    let raw = fs::read_to_string(&audit_log).expect("read audit log");
    let event: Value = serde_json::from_str(raw.trim()).expect("audit json");
    assert_eq!(event["command"], "status");
    assert_eq!(event["outcome"], "success");
}
