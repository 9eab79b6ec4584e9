#![cfg(all(unix, feature = "cli"))]

use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

fn framepipe() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_framepipe"));
    command.arg("--log-level").arg("error");
    command
}

/// Start a long-running subcommand that announces its identifier as JSON.
fn spawn_announcing(args: &[&str]) -> (Child, BufReader<ChildStdout>, u32) {
    let mut child = framepipe()
        .arg("--format")
        .arg("json")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("command should start");
    let stdout = child.stdout.take().expect("stdout should be piped");
    let mut reader = BufReader::new(stdout);

    let mut line = String::new();
    reader
        .read_line(&mut line)
        .expect("identifier line should be readable");
    let announced: serde_json::Value =
        serde_json::from_str(&line).expect("identifier line should be json");
    let id = announced["identifier"]
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .expect("identifier should be a u32");
    assert_eq!(announced["pipe"], format!("framepipe-{id}"));

    (child, reader, id)
}

fn next_json(reader: &mut BufReader<ChildStdout>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).expect("line should be readable");
    serde_json::from_str(&line).expect("line should be json")
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<i32> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().expect("child status should be readable") {
            return status.code();
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            panic!("child did not exit in time");
        }
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn client_quit_reaches_host() {
    let (mut host, mut reader, id) = spawn_announcing(&["host", "--count", "1"]);

    let status = framepipe()
        .arg("client")
        .arg(id.to_string())
        .arg("--send")
        .arg("quit")
        .status()
        .expect("client should run");
    assert!(status.success());

    let received = next_json(&mut reader);
    assert_eq!(received["name"], "QUIT");
    assert_eq!(received["code"], 0x11);
    assert_eq!(received["size"], 32);
    assert_eq!(received["peer"], "client");
    assert_eq!(wait_with_timeout(&mut host, Duration::from_secs(5)), Some(0));
}

#[test]
fn set_size_fields_survive_the_trip() {
    let (mut host, mut reader, id) = spawn_announcing(&["host", "--count", "1"]);

    let status = framepipe()
        .arg("client")
        .arg(id.to_string())
        .arg("--send")
        .arg("set-size:800x600:0")
        .status()
        .expect("client should run");
    assert!(status.success());

    let received = next_json(&mut reader);
    assert_eq!(received["name"], "SET_SIZE_AND_STYLE");
    assert_eq!(received["message"]["kind"], "set_size_and_style");
    assert_eq!(received["message"]["width"], 800);
    assert_eq!(received["message"]["height"], 600);
    assert_eq!(received["message"]["style"], 0);
    assert_eq!(wait_with_timeout(&mut host, Duration::from_secs(5)), Some(0));
}

#[test]
fn echo_sends_frames_back() {
    let (mut echo, _reader, id) = spawn_announcing(&["echo", "--count", "1"]);

    let output = framepipe()
        .arg("--format")
        .arg("json")
        .arg("client")
        .arg(id.to_string())
        .arg("--send")
        .arg("resize:3x4")
        .arg("--count")
        .arg("1")
        .output()
        .expect("client should run");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let echoed: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("client should print json");
    assert_eq!(echoed["name"], "RESIZE");
    assert_eq!(echoed["peer"], "host");
    assert_eq!(echoed["message"]["width"], 3);
    assert_eq!(echoed["message"]["height"], 4);
    assert_eq!(wait_with_timeout(&mut echo, Duration::from_secs(5)), Some(0));
}

#[test]
fn host_sends_to_client() {
    let (mut host, _reader, id) = spawn_announcing(&["host", "--send", "frame-complete"]);

    let output = framepipe()
        .arg("--format")
        .arg("json")
        .arg("client")
        .arg(id.to_string())
        .arg("--count")
        .arg("1")
        .output()
        .expect("client should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"name\":\"FRAME_COMPLETE\""));

    let _ = host.kill();
    let _ = host.wait();
}

#[test]
fn missing_host_is_a_transport_error() {
    let (mut host, _reader, id) = spawn_announcing(&["host"]);
    let _ = host.kill();
    let _ = host.wait();

    let output = framepipe()
        .arg("client")
        .arg(id.to_string())
        .arg("--no-wait")
        .output()
        .expect("client should run");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn accept_timeout_returns_124() {
    let output = framepipe()
        .arg("--format")
        .arg("json")
        .arg("host")
        .arg("--accept-timeout")
        .arg("100ms")
        .output()
        .expect("host should run");
    assert_eq!(output.status.code(), Some(124));
}

#[test]
fn invalid_message_is_a_usage_error() {
    let output = framepipe()
        .arg("client")
        .arg("1")
        .arg("--send")
        .arg("teleport")
        .output()
        .expect("client should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn codes_lists_every_kind() {
    let output = framepipe()
        .arg("--format")
        .arg("json")
        .arg("codes")
        .output()
        .expect("codes should run");
    assert!(output.status.success());

    let codes: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("codes should emit json");
    let codes = codes.as_array().expect("codes should be an array");
    assert_eq!(codes.len(), 10);
    assert_eq!(codes[0]["name"], "BUFFER_COMMIT");
    assert_eq!(codes[9]["name"], "KEYBOARD");
    assert_eq!(codes[9]["category"], "input");
}

#[test]
fn version_reports_package_version() {
    let output = framepipe()
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("framepipe {}", env!("CARGO_PKG_VERSION"))
    );
}
