use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_audit_harness_cli"));
    command.current_dir(env!("CARGO_MANIFEST_DIR"));
    command
}

#[test]
fn kinds_lists_registry() {
    let output = cli().arg("kinds").output().expect("failed to run kinds");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let entries: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect();
    assert!(entries
        .iter()
        .any(|entry| entry["kind"] == "FRESHNESS_HEURISTIC" && entry["level"] == "warning"));
}

#[test]
fn check_hello_succeeds() {
    let output = cli()
        .args(["check", "--path", "/hello"])
        .output()
        .expect("failed to run check");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("check report JSON");
    assert_eq!(json["status"], 200);
    assert_eq!(json["state"]["completed"], true);
}

#[test]
fn check_status_mismatch_exits_with_two() {
    let output = cli()
        .args(["check", "--path", "/404"])
        .output()
        .expect("failed to run check");
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"status_mismatch\""),
        "expected failure JSON in stderr, got {stderr}"
    );
}

#[test]
fn audit_unreachable_url_reports_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|spare| spare.local_addr())
        .expect("spare port")
        .port();
    let output = cli()
        .args(["audit", "--url", &format!("http://127.0.0.1:{port}/")])
        .output()
        .expect("failed to run audit");
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("run state JSON");
    assert_eq!(json["completed"], false);
    assert_eq!(json["terminal_error"]["error"], "connect");
}

#[test]
fn malformed_header_is_an_error() {
    let output = cli()
        .args(["check", "--header", "no-colon-here"])
        .output()
        .expect("failed to run check");
    assert_eq!(output.status.code(), Some(1));
}
