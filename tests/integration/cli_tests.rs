//! Integration tests for the CLI binary.
//!
//! This test is registered as a [[test]] in the unix-attestor-cli crate
//! so that CARGO_BIN_EXE_uattest is available.

use std::process::Command;

/// Get a Command pointing to the `uattest` binary.
fn uattest_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_uattest"))
}

#[test]
fn cli_responds_to_help() {
    let output = uattest_binary()
        .arg("--help")
        .output()
        .expect("failed to execute uattest --help");

    assert!(
        output.status.success(),
        "uattest --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "uattest --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = uattest_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute uattest");

    assert!(
        !output.status.success(),
        "uattest with unknown flag should exit with error"
    );
}

#[test]
fn cli_info_prints_plugin_name() {
    let output = uattest_binary()
        .arg("info")
        .output()
        .expect("failed to execute uattest info");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\": \"unix\""), "got: {stdout}");
}

#[test]
fn cli_attest_from_facts_file() {
    let dir = tempfile::tempdir().unwrap();
    let exe = dir.path().join("exe");
    std::fs::write(&exe, b"data").unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(
        &facts,
        format!(
            r#"{{"42": {{"uids": [4123456789], "gids": [4123456789], "exe_path": "{}"}}}}"#,
            exe.display()
        ),
    )
    .unwrap();

    let output = uattest_binary()
        .args(["attest", "42", "--set", "discover_workload_path=true", "--facts"])
        .arg(&facts)
        .output()
        .expect("failed to execute uattest attest");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "unix:uid:4123456789".to_string(),
            "unix:gid:4123456789".to_string(),
            format!("unix:path:{}", exe.display()),
            "unix:sha256:3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7"
                .to_string(),
        ]
    );
}

#[test]
fn cli_attest_reports_stage_error() {
    let dir = tempfile::tempdir().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, r#"{"7": {"uids": [], "gids": [0]}}"#).unwrap();

    let output = uattest_binary()
        .args(["attest", "7", "--facts"])
        .arg(&facts)
        .output()
        .expect("failed to execute uattest attest");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unix: UIDs lookup: no UIDs for process"),
        "got: {stderr}"
    );
}

#[test]
fn cli_check_config_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("attestor.toml");
    std::fs::write(&config, "discover_workload_path = true\nunknown = 1\n").unwrap();

    let output = uattest_binary()
        .arg("check-config")
        .arg(&config)
        .output()
        .expect("failed to execute uattest check-config");

    assert!(!output.status.success());
}
