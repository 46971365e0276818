//! CLI smoke tests for the slotswap-server binary
//!
//! These run the compiled binary: help output, configuration validation and
//! a short-lived server answering a health check.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn run_slotswap_server(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_slotswap-server"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute slotswap-server")
}

/// Write a config whose home_dir lives inside the temp dir.
fn write_config(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let home = dir.path().join("home").to_string_lossy().replace('\\', "/");
    let path = dir.path().join(name);
    let content = format!("server:\n  home_dir: \"{home}\"\n  host: \"127.0.0.1\"\n  port: 0\n{body}");
    std::fs::write(&path, content).expect("Failed to write config file");
    path
}

fn path_str(p: &Path) -> &str {
    p.to_str().expect("utf-8 temp path")
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("no free port")
}

#[test]
fn test_cli_help_command() {
    let output = run_slotswap_server(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slotswap-server"), "Should contain binary name");
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--print-config"));
}

#[test]
fn test_cli_version_command() {
    let output = run_slotswap_server(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("slotswap-server 0.1.0"), "{}", stdout);
}

#[test]
fn test_cli_invalid_command() {
    let output = run_slotswap_server(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "{}", stderr);
}

#[test]
fn test_cli_config_validation_missing_file() {
    for flag in ["--config", "-c"] {
        let output = run_slotswap_server(&[flag, "/nonexistent/config.yaml", "check"]);

        assert!(!output.status.success(), "Should fail with missing config");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("config file not found"), "{}", stderr);
    }
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_slotswap_server(&["--config", path_str(&config_path), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "{}", stderr);
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "valid.yaml",
        r#"
logging:
  default:
    console_level: info
    file: "logs/slotswap.log"
    file_level: info
    max_backups: 3
    max_size_mb: 10

modules:
  slot_swap:
    max_title_length: 120
    pending_ttl: 2h
    sweep_interval: 1m
"#,
    );

    let output = run_slotswap_server(&["--config", path_str(&config_path), "check"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "STDOUT: {stdout}\nSTDERR: {stderr}");
    assert!(stdout.contains("Configuration check passed"));
    assert!(stdout.contains("max_title_length: 120"));
}

#[test]
fn test_cli_check_rejects_bad_module_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &temp_dir,
        "bad_module.yaml",
        "modules:\n  slot_swap:\n    max_title_lenght: 10\n",
    );

    let output = run_slotswap_server(&["--config", path_str(&config_path), "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("slot_swap"), "{}", stderr);
}

#[test]
fn test_cli_run_command_invalid_bind_address() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("bad_host.yaml");
    let home = temp_dir.path().join("home").to_string_lossy().replace('\\', "/");
    std::fs::write(
        &config_path,
        format!("server:\n  home_dir: \"{home}\"\n  host: \"not a host\"\n  port: 5000\n"),
    )
    .expect("Failed to write config file");

    let output = run_slotswap_server(&["--config", path_str(&config_path), "run"]);

    assert!(!output.status.success(), "Should fail with invalid bind address");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid bind address"), "{}", stderr);
}

#[test]
fn test_cli_print_config_applies_port_override() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "print.yaml", "");

    let output = run_slotswap_server(&[
        "--config",
        path_str(&config_path),
        "--port",
        "7111",
        "--print-config",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port: 7111"), "{}", stdout);
}

#[test]
fn test_cli_subcommand_help() {
    let output = run_slotswap_server(&["run", "--help"]);
    assert!(output.status.success(), "Run subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Start the server"));

    let output = run_slotswap_server(&["check", "--help"]);
    assert!(output.status.success(), "Check subcommand help should succeed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Check configuration"));
}

#[tokio::test]
async fn test_cli_run_serves_health() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, "run.yaml", "");
    let port = free_port();

    let mut child = tokio::process::Command::new(env!("CARGO_BIN_EXE_slotswap-server"))
        .args(["--config", path_str(&config_path), "--port", &port.to_string(), "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn slotswap-server");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    let mut stream = loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => break stream,
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Err(e) => panic!("server never started listening: {e}"),
        }
    };

    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.to_ascii_lowercase().contains("x-request-id"));
    assert!(response.contains(r#""ok":true"#), "{}", response);

    child.kill().await.unwrap();
}
