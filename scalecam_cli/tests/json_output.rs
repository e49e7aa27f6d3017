use assert_cmd::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!(
        r#"
[device]
tick_ms = 10

[capture]
endpoint_url = "http://localhost:3000/api/analyze-food"
flush_settle_ms = 0

{extra}
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn scalecam() -> Command {
    let mut cmd = Command::cargo_bin("scalecam_cli").unwrap();
    for key in [
        "DATABASE_URL",
        "API_KEY",
        "USER_EMAIL",
        "USER_PASSWORD",
        "RUST_LOG",
        "SCALECAM_SIM_STEP_G",
        "SCALECAM_SIM_HTTP_CODE",
        "SCALECAM_SIM_CAMERA_FAIL",
        "SCALECAM_SIM_AUTH_STEPS",
        "SCALECAM_SIM_DB_FAIL",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("SCALECAM_SIM_HTTP_CODE", "200");
    cmd
}

fn json_line(stdout: &[u8], key: &str) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let line = stdout
        .lines()
        .find(|l| l.contains(&format!("\"{key}\"")))
        .unwrap_or_else(|| panic!("no JSON line with {key}; stdout was: {stdout}"));
    serde_json::from_str(line).expect("valid JSON")
}

#[test]
fn run_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--ticks", "4"])
        .env("SCALECAM_SIM_STEP_G", "6")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "ticks");
    assert_eq!(v["command"], "run");
    assert_eq!(v["ticks"], 4);
    assert_eq!(v["changes"], 3);
    assert_eq!(v["published"], 3);
    assert_eq!(v["captures_ok"], 3);
    assert_eq!(v["captures_failed"], 0);
    assert_eq!(v["auth"], "not_initialized");
    let last = v["last_weight_g"].as_f64().expect("number");
    assert!((last - 17.94).abs() < 0.01, "last weight {last}");
}

#[test]
fn failed_uploads_and_publishes_are_counted_not_fatal() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--ticks", "3"])
        .env("SCALECAM_SIM_STEP_G", "6")
        .env("SCALECAM_SIM_HTTP_CODE", "-1")
        .env("SCALECAM_SIM_DB_FAIL", "1")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "ticks");
    assert_eq!(v["changes"], 2);
    assert_eq!(v["publish_failures"], 2);
    assert_eq!(v["captures_ok"], 0);
    assert_eq!(v["captures_failed"], 2);
}

#[test]
fn require_publish_suppresses_photos() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let text = fs::read_to_string(&cfg)
        .unwrap()
        .replace("flush_settle_ms = 0", "flush_settle_ms = 0\nrequire_publish = true");
    fs::write(&cfg, text).unwrap();

    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--ticks", "3"])
        .env("SCALECAM_SIM_STEP_G", "6")
        .env("SCALECAM_SIM_DB_FAIL", "1")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "ticks");
    assert_eq!(v["changes"], 2);
    assert_eq!(v["captures_ok"], 0);
    assert_eq!(v["captures_failed"], 0);
}

#[test]
fn stuck_auth_times_out_every_tick() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[auth]\ndeadline_ms = 20\npoll_interval_ms = 5");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--ticks", "2"])
        .env("API_KEY", "key")
        .env("USER_EMAIL", "scale@example.invalid")
        .env("USER_PASSWORD", "hunter2")
        .env("SCALECAM_SIM_AUTH_STEPS", "stuck")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "ticks");
    assert_eq!(v["auth"], "timed_out");
    assert_eq!(v["auth_timeouts"], 2);
}

#[test]
fn self_check_auth_timeout_is_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[auth]\ndeadline_ms = 20\npoll_interval_ms = 5");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .env("API_KEY", "key")
        .env("USER_EMAIL", "scale@example.invalid")
        .env("USER_PASSWORD", "hunter2")
        .env("SCALECAM_SIM_AUTH_STEPS", "stuck")
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "reason");
    assert_eq!(v["reason"], "AuthTimeout");
    assert!(v["details"]["waited_ms"].as_u64().unwrap() >= 20);
}

#[test]
fn capture_reports_upload_ack() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("capture")
        .env("SCALECAM_SIM_HTTP_CODE", "201")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "status_code");
    assert_eq!(v["status_code"], 201);
    assert!(v["bytes_sent"].as_u64().unwrap() > 0);
}

#[test]
fn config_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "[remote]\nweight_path = \"scale/weight\"");
    let out = scalecam()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let v = json_line(&out, "reason");
    assert_eq!(v["reason"], "Config");
    assert!(
        v["message"]
            .as_str()
            .unwrap()
            .contains("remote.weight_path must start with '/'")
    );
}

#[test]
fn health_reports_presence_without_secrets() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let out = scalecam()
        .arg("--config")
        .arg(&cfg)
        .arg("health")
        .env("DATABASE_URL", "https://scale-db.example.invalid")
        .env("API_KEY", "key-123")
        .env("USER_EMAIL", "scale@example.invalid")
        .env("USER_PASSWORD", "hunter2")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8_lossy(&out);
    assert!(!text.contains("hunter2"));
    assert!(!text.contains("key-123"));
    let v = json_line(&out, "status");
    assert_eq!(v["status"], "ok");
    assert_eq!(v["device_kind"], "potentiometer");
    assert_eq!(v["database_url_set"], true);
    assert_eq!(v["user_auth"], true);
}
