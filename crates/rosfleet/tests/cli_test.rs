//! Integration tests for the `rosfleet` CLI binary.
//!
//! Most tests exercise argument parsing, help output, completions and
//! error handling without a device. The end-to-end tests run the binary
//! against a wiremock server speaking the RouterOS REST bridge.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const ISOLATED_HOME: &str = "/tmp/rosfleet-cli-test-nonexistent";

/// Build a [`Command`] for the `rosfleet` binary with env isolation.
///
/// Clears all `ROSFLEET_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn rosfleet_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("rosfleet");
    cmd.env("HOME", ISOLATED_HOME)
        .env("XDG_CONFIG_HOME", ISOLATED_HOME)
        .env("ROSFLEET_CONFIG", format!("{ISOLATED_HOME}/config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("ROSFLEET_DEVICE")
        .env_remove("ROSFLEET_HOST")
        .env_remove("ROSFLEET_USER")
        .env_remove("ROSFLEET_PASSWORD")
        .env_remove("ROSFLEET_PORT")
        .env_remove("ROSFLEET_OUTPUT")
        .env_remove("ROSFLEET_INSECURE")
        .env_remove("ROSFLEET_TIMEOUT")
        .env_remove("ROSFLEET_DEFAULT_DEVICE")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Arguments pointing a one-off device at the mock server.
fn mock_device_args(server: &MockServer) -> Vec<String> {
    [
        "--host",
        "127.0.0.1",
        "--port",
        &server.address().port().to_string(),
        "--plain-http",
        "--user",
        "api",
        "--password",
        "s3cret",
        "--timeout",
        "5",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_blocking(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || rosfleet_cmd().args(args).output().unwrap())
        .await
        .unwrap()
}

async fn mount_print(server: &MockServer, menu: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/rest{menu}/print")))
        .and(basic_auth("api", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = rosfleet_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    rosfleet_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("RouterOS")
            .and(predicate::str::contains("interfaces"))
            .and(predicate::str::contains("routes"))
            .and(predicate::str::contains("firewall"))
            .and(predicate::str::contains("stats")),
    );
}

#[test]
fn test_version_flag() {
    rosfleet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rosfleet"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    rosfleet_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    rosfleet_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = rosfleet_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_no_device_configured() {
    let output = rosfleet_cmd().args(["interfaces", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No device selected"), "unexpected output:\n{text}");
}

#[test]
fn test_invalid_output_format() {
    let output = rosfleet_cmd()
        .args(["--output", "invalid", "interfaces", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_stats_interval() {
    let output = rosfleet_cmd()
        .args(["stats", "--interval", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_destructive_command_requires_yes_without_tty() {
    // stdin is not a terminal under the test harness, so the prompt is
    // refused before any connection attempt.
    let output = rosfleet_cmd()
        .args([
            "--host",
            "127.0.0.1",
            "--port",
            "9",
            "--password",
            "x",
            "system",
            "reboot",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honours_env() {
    rosfleet_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{ISOLATED_HOME}/config.toml")));
}

#[test]
fn test_config_show_no_config() {
    rosfleet_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Devices:        (none)"));
}

#[test]
fn test_config_show_masks_plaintext_password() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "default_device = \"core-1\"\n\n[devices.core-1]\nhost = \"10.0.0.1\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    let output = rosfleet_cmd()
        .env("ROSFLEET_CONFIG", &file)
        .args(["--output", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let cfg: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["default_device"], "core-1");
    assert_eq!(cfg["devices"]["core-1"]["password"], "****");
}

#[test]
fn test_unknown_device_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "[devices.core-1]\nhost = \"10.0.0.1\"\n").unwrap();

    let output = rosfleet_cmd()
        .env("ROSFLEET_CONFIG", &file)
        .args(["--device", "nope", "interfaces", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("config show"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_firewall_subcommands_exist() {
    rosfleet_cmd()
        .args(["firewall", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("nat")
                .and(predicate::str::contains("filter"))
                .and(predicate::str::contains("masquerade"))
                .and(predicate::str::contains("block"))
                .and(predicate::str::contains("sync"))
                .and(predicate::str::contains("clear")),
        );
}

#[test]
fn test_system_subcommands_exist() {
    rosfleet_cmd()
        .args(["system", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("info")
                .and(predicate::str::contains("identity"))
                .and(predicate::str::contains("ntp"))
                .and(predicate::str::contains("dhcp-alert"))
                .and(predicate::str::contains("init"))
                .and(predicate::str::contains("reboot")),
        );
}

#[test]
fn test_routes_subcommands_exist() {
    rosfleet_cmd()
        .args(["routes", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("add"))
                .and(predicate::str::contains("failover"))
                .and(predicate::str::contains("clear")),
        );
}

// ── End to end against a mock device ────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_system_info_json() {
    let server = MockServer::start().await;
    mount_print(&server, "/system/identity", json!([{"name": "edge-01"}])).await;
    mount_print(
        &server,
        "/system/routerboard",
        json!([{"model": "RB5009UG+S+", "serial-number": "HG1234", "current-firmware": "7.14"}]),
    )
    .await;
    mount_print(
        &server,
        "/system/resource",
        json!([{
            "uptime": "1d2h",
            "version": "7.14 (stable)",
            "cpu-load": "12",
            "free-memory": "268435456",
            "total-memory": "1073741824"
        }]),
    )
    .await;

    let mut args = mock_device_args(&server);
    args.extend(["-o", "json", "system", "info"].map(str::to_owned));
    let output = run_blocking(args).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let info: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["identity"], "edge-01");
    assert_eq!(info["model"], "RB5009UG+S+");
    assert_eq!(info["serialNumber"], "HG1234");
    assert_eq!(info["cpuLoadPercent"], 12);
    assert_eq!(info["freeMemoryMB"], 256.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stats_first_poll_reads_zero() {
    let server = MockServer::start().await;
    mount_print(&server, "/system/identity", json!([{"name": "edge-01"}])).await;
    mount_print(
        &server,
        "/system/resource",
        json!([{"uptime": "5m", "version": "7.14", "cpu-load": "3", "free-memory": "1048576"}]),
    )
    .await;
    mount_print(
        &server,
        "/interface",
        json!([
            {".id": "*1", "name": "ether1", "type": "ether", "running": "true", "rx-byte": "1000", "tx-byte": "500"},
            {".id": "*2", "name": "ether2", "type": "ether", "running": "false", "rx-byte": "0", "tx-byte": "0"}
        ]),
    )
    .await;

    let mut args = mock_device_args(&server);
    args.extend(["-o", "json", "stats"].map(str::to_owned));
    let output = run_blocking(args).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let sample: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(sample["device"], "127.0.0.1");
    assert_eq!(sample["cpuLoadPercent"], 3);
    let interfaces = sample["interfaces"].as_array().unwrap();
    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[0]["name"], "ether1");
    assert_eq!(interfaces[0]["isRunning"], true);
    assert_eq!(interfaces[0]["rxBytesPerSecond"], 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refused_credentials_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": 401,
            "message": "Unauthorized"
        })))
        .mount(&server)
        .await;

    let mut args = mock_device_args(&server);
    args.extend(["interfaces", "list"].map(str::to_owned));
    let output = run_blocking(args).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_device_exit_code() {
    let output = run_blocking(
        [
            "--host",
            "127.0.0.1",
            "--port",
            "9",
            "--plain-http",
            "--password",
            "x",
            "--timeout",
            "2",
            "system",
            "identity",
        ]
        .map(str::to_owned)
        .to_vec(),
    )
    .await;

    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
