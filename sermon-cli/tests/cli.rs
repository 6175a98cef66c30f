use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn sermon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sermon"))
}

fn run_with_stdin(args: &[&str], input: &str) -> std::process::Output {
    let mut child = sermon()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run sermon");
    child.stdin.take().expect("stdin").write_all(input.as_bytes()).expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for sermon")
}

#[test]
fn test_cli_help() {
    let output = sermon().arg("--help").output().expect("Failed to run sermon");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: sermon"));
    assert!(stdout.contains("monitor"));
    assert!(stdout.contains("flatten"));
}

#[test]
fn test_cli_bauds() {
    let output = sermon().arg("bauds").output().expect("Failed to run sermon");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 16);
    assert_eq!(lines[0], "300");
    assert!(lines.contains(&"921600 (default)"));
}

#[test]
fn test_cli_flatten_stdin() {
    let output = run_with_stdin(&["flatten"], r#"{"a": {"b": 1, "c": [true, "x"]}, "d": {}}"#);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), ["key: a_b, val: 1", "key: a_c_0, val: true", "key: a_c_1, val: x"]);
}

#[test]
fn test_cli_flatten_json_output() {
    let output = run_with_stdin(&["flatten", "--json"], r#"{"z": 1, "a": [10, 20]}"#);

    assert!(output.status.success());
    let flat: serde_json::Value = serde_json::from_slice(&output.stdout).expect("Output is not JSON");
    assert_eq!(flat, serde_json::json!({"z": 1, "a_0": 10, "a_1": 20}));
}

#[test]
fn test_cli_flatten_rejects_malformed_input() {
    let output = run_with_stdin(&["flatten"], "I (312) wifi: connected");
    assert!(!output.status.success());
}

#[test]
fn test_cli_rejects_unsupported_baud() {
    let output = run_with_stdin(&["monitor", "--mock", "--baud", "12345"], "");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("12345"));
}

#[test]
fn test_cli_mock_monitor_exit() {
    let started = Instant::now();
    let output = run_with_stdin(&["monitor", "--mock"], "status\nexit\n");

    assert!(output.status.success());
    assert!(started.elapsed() < Duration::from_secs(10));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("** Opening Serial Port"));
    assert!(stdout.contains("** Baud Rate: 921600"));
    assert!(stdout.contains(">> status"));
}

#[test]
fn test_cli_mock_monitor_sends_input_verbatim() {
    let output = run_with_stdin(&["monitor", "--mock"], "status  \nexit  \nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(">> status  \n"));
    // Padded "exit" is an ordinary command; only the exact literal quits
    assert!(stdout.contains(">> exit  \n"));
}
