//! Subcommand bodies. Each prints one summary line (JSON with `--json`).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use scalecam_config::{Config, Credentials};
use scalecam_core::{AuthStatus, RunStats, ScaleError, WeightSource};
use serde_json::json;

use crate::assemble::CliDevice;

pub fn auth_name(status: AuthStatus) -> &'static str {
    match status {
        AuthStatus::Ready => "ready",
        AuthStatus::NotInitialized => "not_initialized",
        AuthStatus::TimedOut { .. } => "timed_out",
    }
}

/// Tick until Ctrl-C or `ticks` have run.
pub fn run(device: &mut CliDevice, ticks: Option<u64>, json: bool) -> eyre::Result<RunStats> {
    let setup = device.setup();
    if let Some(e) = &setup.camera_error {
        tracing::warn!(error = %e, "running without a camera; captures will fail");
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .map_err(|e| eyre::eyre!("install Ctrl-C handler: {e}"))?;

    let stats = device.run(&shutdown, ticks);
    if json {
        println!(
            "{}",
            json!({
                "command": "run",
                "camera": if setup.camera_ready() { "ready" } else { "failed" },
                "auth": auth_name(setup.auth),
                "ticks": stats.ticks,
                "changes": stats.changes,
                "published": stats.published,
                "publish_failures": stats.publish_failures,
                "captures_ok": stats.captures_ok,
                "captures_failed": stats.captures_failed,
                "sensor_skips": stats.sensor_skips,
                "auth_timeouts": stats.auth_timeouts,
                "last_weight_g": device.filter_state().last_accepted_g,
            })
        );
    } else {
        println!(
            "run complete: ticks={} changes={} published={} captures_ok={} captures_failed={} sensor_skips={}",
            stats.ticks,
            stats.changes,
            stats.published,
            stats.captures_ok,
            stats.captures_failed,
            stats.sensor_skips
        );
    }
    Ok(stats)
}

pub fn capture(device: &mut CliDevice, json: bool) -> eyre::Result<()> {
    if let Some(e) = device.setup().camera_error {
        return Err(e.into());
    }
    let ack = device.capture_now()?;
    if json {
        println!(
            "{}",
            json!({
                "command": "capture",
                "status_code": ack.status_code,
                "bytes_sent": ack.bytes_sent,
                "body": ack.body,
            })
        );
    } else {
        println!(
            "capture complete: {} bytes sent (code {})",
            ack.bytes_sent, ack.status_code
        );
    }
    Ok(())
}

/// Camera must come up, a configured session must sign in and the source
/// must produce one valid reading.
pub fn self_check(device: &mut CliDevice, json: bool) -> eyre::Result<()> {
    let setup = device.setup();
    if let Some(e) = setup.camera_error {
        return Err(e.into());
    }
    if let AuthStatus::TimedOut { waited_ms } = setup.auth {
        return Err(ScaleError::AuthTimeout { waited_ms }.into());
    }
    let source = device.source().kind();
    let sample = device.source_mut().read();
    if !sample.is_valid() {
        return Err(ScaleError::SensorUnavailable(format!("{source} read failed")).into());
    }
    let auth = auth_name(setup.auth);
    if json {
        println!(
            "{}",
            json!({
                "command": "self-check",
                "status": "ok",
                "source": source,
                "weight_g": sample.grams,
                "auth": auth,
            })
        );
    } else {
        println!(
            "self-check ok: source={source} weight={:.1} g camera=ready auth={auth}",
            sample.grams
        );
    }
    Ok(())
}

/// Configuration summary for monitoring. Touches no hardware and never prints secrets.
pub fn health(cfg: &Config, creds: &Credentials, config_path: &std::path::Path) {
    println!(
        "{}",
        json!({
            "status": "ok",
            "config": config_path.display().to_string(),
            "device_kind": cfg.device.kind.as_str(),
            "tick_ms": cfg.device.tick_ms,
            "endpoint_url": cfg.capture.endpoint_url.trim(),
            "database_url_set": cfg.database_url(creds).is_some(),
            "user_auth": creds.has_user_auth(),
            "calibrated": cfg.calibration.is_some(),
        })
    );
}
