//! Human-readable error descriptions and structured JSON error formatting.

use scalecam_core::error::{BuildError, ScaleError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/scalecam.toml for a sample."
        );
    }

    if let Some(se) = err.downcast_ref::<ScaleError>() {
        return match se {
            ScaleError::SensorUnavailable(what) => format!(
                "What happened: A sensor was unavailable ({what}).\nLikely causes: Camera or load cell not connected, no power, or wrong pins.\nHow to fix: Check wiring and the [pins] section, then rerun self-check."
            ),
            ScaleError::TransportFailure { code, message } => format!(
                "What happened: Network request failed ({message}, code {code}).\nLikely causes: Upload endpoint or database unreachable, or Wi-Fi down.\nHow to fix: Verify capture.endpoint_url and DATABASE_URL, and that the host is reachable."
            ),
            ScaleError::AuthTimeout { waited_ms } => format!(
                "What happened: The cloud session was not ready after {waited_ms} ms.\nLikely causes: Wrong API_KEY, USER_EMAIL or USER_PASSWORD, or no network.\nHow to fix: Check the credentials in the environment, or raise auth.deadline_ms."
            ),
            ScaleError::Hardware(what) => format!(
                "What happened: Hardware error ({what}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO."
            ),
            ScaleError::Config(what) => config_hint(what),
        };
    }

    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();
    if lower.contains("hx711") && lower.contains("timeout") {
        return "What happened: HX711 did not produce data within the driver timeout.\nLikely causes: Wrong DT/SCK pins or wiring/power issues.\nHow to fix: Check [pins] in the config and verify 5V/GND.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn config_hint(what: &str) -> String {
    let lower = what.to_ascii_lowercase();

    // Calibration CSV header special-case
    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'raw,grams'.".to_string();
    }
    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file ({what}).\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config pointing at a readable TOML file."
        );
    }
    if lower.contains("pin") && lower.contains("missing") {
        return format!(
            "What happened: Configuration is incomplete ({what}).\nLikely causes: Missing [pins] entry for the selected device kind.\nHow to fix: Add the pin to the [pins] section and try again."
        );
    }
    format!(
        "What happened: Configuration is invalid ({what}).\nLikely causes: Missing sections or out-of-range values.\nHow to fix: Edit the TOML config and try again."
    )
}

/// Stable exit codes: 2 for configuration, 3 for hardware and sensors, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ScaleError>() {
        Some(ScaleError::Config(_)) => 2,
        Some(ScaleError::SensorUnavailable(_) | ScaleError::Hardware(_)) => 3,
        _ => 1,
    }
}

/// Short name for the `reason` field of JSON errors.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<ScaleError>() {
        Some(ScaleError::SensorUnavailable(_)) => "SensorUnavailable",
        Some(ScaleError::TransportFailure { .. }) => "TransportFailure",
        Some(ScaleError::AuthTimeout { .. }) => "AuthTimeout",
        Some(ScaleError::Hardware(_)) => "Hardware",
        Some(ScaleError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let obj = match err.downcast_ref::<ScaleError>() {
        Some(ScaleError::AuthTimeout { waited_ms }) => json!({
            "reason": reason_name(err),
            "details": { "waited_ms": waited_ms },
            "message": humanize(err),
        }),
        Some(ScaleError::TransportFailure { code, .. }) => json!({
            "reason": reason_name(err),
            "details": { "code": code },
            "message": humanize(err),
        }),
        _ => json!({ "reason": reason_name(err), "message": humanize(err) }),
    };
    obj.to_string()
}
