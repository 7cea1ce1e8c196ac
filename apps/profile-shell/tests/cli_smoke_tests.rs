//! CLI smoke tests for the profile-shell binary
//!
//! These tests run the real binary: help output, configuration validation
//! and a scripted session against the in-memory service.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper to run the profile-shell binary with given arguments
fn run_profile_shell(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_profile-shell"))
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute profile-shell")
}

/// Helper to run the binary feeding `script` on stdin
fn run_profile_shell_with_input(args: &[&str], script: &str) -> std::process::Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_profile-shell"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn profile-shell");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("Failed to write script");

    child.wait_with_output().expect("Failed to wait for profile-shell")
}

/// Config whose home_dir and log files stay inside `dir`
fn write_config(dir: &Path, extra: &str) -> String {
    let path = dir.join("config.yaml");
    let content = format!(
        r#"
client:
  home_dir: "{}"
  base_url: "http://127.0.0.1:9"
  timeout_sec: 2

logging:
  default:
    console_level: "off"
    file: "logs/profile-view.log"
    file_level: info
    max_backups: 1
    max_size_mb: 1
{extra}"#,
        dir.join("home").display()
    );
    std::fs::write(&path, content).expect("Failed to write config file");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_profile_shell(&["--help"]);

    assert!(output.status.success(), "Help command should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"), "Should contain usage information");
    assert!(stdout.contains("run"), "Should contain 'run' subcommand");
    assert!(stdout.contains("check"), "Should contain 'check' subcommand");
    assert!(stdout.contains("--config"), "Should mention config option");
    assert!(stdout.contains("--mock"), "Should mention mock option");
}

#[test]
fn test_cli_version_command() {
    let output = run_profile_shell(&["--version"]);

    assert!(output.status.success(), "Version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("profile-shell"), "Should contain binary name");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_profile_shell(&["invalid-command"]);

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should report the error: {stderr}");
}

#[test]
fn test_cli_config_validation_missing_file() {
    let output = run_profile_shell(&["--config", "/nonexistent/config.yaml", "check"]);

    assert!(!output.status.success(), "Should fail with missing config");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Config file not found"),
        "Should mention config file issue: {stderr}"
    );
}

#[test]
fn test_cli_config_validation_invalid_yaml() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid.yaml");
    std::fs::write(&config_path, "invalid: yaml: content: [unclosed")
        .expect("Failed to write file");

    let output = run_profile_shell(&["--config", config_path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Should fail with invalid YAML");
}

#[test]
fn test_cli_config_validation_valid_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        r#"
modules:
  profile_view:
    storage_path: "media/"
"#,
    );

    let output = run_profile_shell(&["--config", &config_path, "check"]);

    if !output.status.success() {
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Should succeed with valid config");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration check passed"));
    assert!(temp_dir.path().join("home").is_dir(), "home_dir is created");
}

#[test]
fn test_cli_rejects_unknown_module_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        temp_dir.path(),
        r#"
modules:
  profile_view:
    colour: "blue"
"#,
    );

    let output = run_profile_shell(&["--config", &config_path, "check"]);

    assert!(!output.status.success(), "Unknown module keys should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("profile_view"), "Should name the module: {stderr}");
}

#[test]
fn test_cli_print_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");

    let output = run_profile_shell(&[
        "--config",
        &config_path,
        "--base-url",
        "http://override.test:8080",
        "--print-config",
    ]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("http://override.test:8080"), "{stdout}");
}

#[test]
fn test_cli_mock_session_script() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");

    let script = "\
login demo@example.com password123
tab bookings
password password123 new-password other-password
logout
quit
";
    let output = run_profile_shell_with_input(&["--config", &config_path, "--mock", "run"], script);

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        eprintln!("STDOUT: {stdout}");
        eprintln!("STDERR: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert!(output.status.success(), "Scripted session should succeed");

    assert!(stdout.contains("[ok] Welcome back!"), "{stdout}");
    assert!(stdout.contains("#1001 Cleaning"), "{stdout}");
    assert!(stdout.contains("[error] New passwords do not match"), "{stdout}");
    assert!(stdout.contains("== Sign in =="), "{stdout}");
}

#[test]
fn test_cli_mock_session_ends_on_eof() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");

    let output = run_profile_shell_with_input(&["--config", &config_path, "--mock"], "show\n");

    assert!(output.status.success(), "EOF should end the shell cleanly");
}

#[test]
fn test_cli_shell_help_and_quoting() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(temp_dir.path(), "");

    let script = "\
help
login demo@example.com password123
set name 'Demo  User'
save
quit
";
    let output = run_profile_shell_with_input(&["--config", &config_path, "--mock"], script);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{stdout}");
    assert!(stdout.contains("cancel-pick"), "{stdout}");
    assert!(stdout.contains("== Demo  User <demo@example.com> =="), "{stdout}");
}
