#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the scale firmware.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - Each `[device] kind` carries a preset for the change filter, the photo
//!   threshold and the auth deadline; explicit keys override the preset.
//! - Cloud credentials never live in the file, see `Credentials::from_env`.
//! - Load-cell calibration can come from a `raw,grams` CSV (`calibration`).
use serde::Deserialize;
use serde::de::Deserializer;

pub mod calibration;

pub use calibration::{CalibrationRow, LoadCellCalibration, load_calibration_csv};

/// Which weight signal this hardware revision has.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Potentiometer,
    Button,
    LoadCell,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Potentiometer => "potentiometer",
            DeviceKind::Button => "button",
            DeviceKind::LoadCell => "load_cell",
        }
    }
}

/// Photo trigger distance from the weight at the last successful capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotoThreshold {
    Grams(f32),
    /// Every accepted weight change triggers a capture.
    EveryChange,
}

/// Per-kind defaults, tuned on the three hardware revisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub min_delta_g: f32,
    pub debounce_ms: u64,
    pub photo_threshold: PhotoThreshold,
    pub auth_deadline_ms: u64,
}

impl Preset {
    pub fn for_kind(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Potentiometer => Self {
                min_delta_g: 0.5,
                debounce_ms: 0,
                photo_threshold: PhotoThreshold::Grams(5.0),
                auth_deadline_ms: 120_000,
            },
            DeviceKind::Button => Self {
                min_delta_g: 5.0,
                debounce_ms: 50,
                photo_threshold: PhotoThreshold::EveryChange,
                auth_deadline_ms: 120_000,
            },
            DeviceKind::LoadCell => Self {
                min_delta_g: 20.0,
                debounce_ms: 1000,
                photo_threshold: PhotoThreshold::EveryChange,
                auth_deadline_ms: 60_000,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceCfg {
    pub kind: DeviceKind,
    /// Control loop period (ms).
    pub tick_ms: u64,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            kind: DeviceKind::Potentiometer,
            tick_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Pins {
    pub potentiometer: Option<u8>,
    pub button: Option<u8>,
    pub hx711_dt: Option<u8>,
    pub hx711_sck: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PotentiometerCfg {
    pub adc_max: u16,
    pub min_weight_g: f32,
    pub max_weight_g: f32,
}

impl Default for PotentiometerCfg {
    fn default() -> Self {
        Self {
            adc_max: 4095,
            min_weight_g: 0.0,
            max_weight_g: 500.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ButtonCfg {
    /// Grams added per debounced edge.
    pub increment_g: f32,
    /// Level must hold this long before an edge is confirmed.
    pub debounce_ms: u64,
    /// Count release edges as well as presses.
    pub release_adds: bool,
    pub max_weight_g: f32,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self {
            increment_g: 10.0,
            debounce_ms: 50,
            release_adds: false,
            max_weight_g: 5000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoadCellCfg {
    /// Raw conversions averaged per reading.
    pub samples: u8,
    /// Raw conversions averaged for the startup tare.
    pub tare_samples: u8,
    /// Grams per raw count; overridden by a persisted or CSV calibration.
    pub scale_factor: f32,
    /// Total SCK pulses per conversion (25 = channel A, gain 128).
    pub gain_pulses: u8,
}

impl Default for LoadCellCfg {
    fn default() -> Self {
        Self {
            samples: 5,
            tare_samples: 10,
            scale_factor: 1.0,
            gain_pulses: 25,
        }
    }
}

/// Change-filter overrides; unset keys fall back to the device preset.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FilterCfg {
    pub min_delta_g: Option<f32>,
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureCfg {
    /// Grams (e.g. `5.0`) or `"every_change"`; unset uses the device preset.
    #[serde(deserialize_with = "de_photo_threshold")]
    pub photo_threshold: Option<PhotoThreshold>,
    /// Upload target for captured JPEGs.
    pub endpoint_url: String,
    /// Stale frames discarded before the real capture.
    pub flush_frames: u8,
    /// Pause between flushed frames (ms).
    pub flush_settle_ms: u64,
    /// Only evaluate the photo trigger when the weight publish succeeded.
    pub require_publish: bool,
    /// Connect plus read timeout for one upload (ms).
    pub upload_timeout_ms: u64,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self {
            photo_threshold: None,
            endpoint_url: String::new(),
            flush_frames: 3,
            flush_settle_ms: 30,
            require_publish: false,
            upload_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FrameSizeCfg {
    Qvga,
    Vga,
    #[default]
    Svga,
    Sxga,
    Uxga,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CameraCfg {
    pub frame_size: FrameSizeCfg,
    /// 0..=63, lower is better quality.
    pub jpeg_quality: u8,
    pub frame_buffers: u8,
}

impl Default for CameraCfg {
    fn default() -> Self {
        Self {
            frame_size: FrameSizeCfg::Svga,
            jpeg_quality: 12,
            frame_buffers: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteCfg {
    /// Realtime database root; `DATABASE_URL` in the environment wins.
    pub database_url: Option<String>,
    /// Key the weight is written to.
    pub weight_path: String,
}

impl Default for RemoteCfg {
    fn default() -> Self {
        Self {
            database_url: None,
            weight_path: "/scale/weight".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthCfg {
    /// Give up waiting for the session after this long; unset uses the preset.
    pub deadline_ms: Option<u64>,
    /// Sleep between session steps while waiting.
    pub poll_interval_ms: u64,
}

impl Default for AuthCfg {
    fn default() -> Self {
        Self {
            deadline_ms: None,
            poll_interval_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceCfg,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub potentiometer: PotentiometerCfg,
    #[serde(default)]
    pub button: ButtonCfg,
    #[serde(default)]
    pub load_cell: LoadCellCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    pub capture: CaptureCfg,
    #[serde(default)]
    pub camera: CameraCfg,
    #[serde(default)]
    pub remote: RemoteCfg,
    #[serde(default)]
    pub auth: AuthCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Persisted load-cell calibration; preferred over a startup tare when present.
    #[serde(default)]
    pub calibration: Option<LoadCellCalibration>,
}

/// Preset values merged with explicit overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Effective {
    pub min_delta_g: f32,
    pub debounce_ms: u64,
    pub photo_threshold: PhotoThreshold,
    pub auth_deadline_ms: u64,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

fn de_photo_threshold<'de, D>(deserializer: D) -> Result<Option<PhotoThreshold>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Grams(f32),
        Keyword(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Grams(g)) => Ok(Some(PhotoThreshold::Grams(g))),
        Some(Raw::Keyword(k)) if k == "every_change" => Ok(Some(PhotoThreshold::EveryChange)),
        Some(Raw::Keyword(k)) => Err(serde::de::Error::custom(format!(
            "photo_threshold must be grams or \"every_change\", got \"{k}\""
        ))),
    }
}

/// Cloud credentials, read from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub user_email: Option<String>,
    pub user_password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("database_url", &self.database_url)
            .field("api_key", &redact(&self.api_key))
            .field("user_email", &self.user_email)
            .field("user_password", &redact(&self.user_password))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let mut get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        Self {
            database_url: get("DATABASE_URL"),
            api_key: get("API_KEY"),
            user_email: get("USER_EMAIL"),
            user_password: get("USER_PASSWORD"),
        }
    }

    /// Email/password sign-in needs all three of key, email and password.
    pub fn has_user_auth(&self) -> bool {
        self.api_key.is_some() && self.user_email.is_some() && self.user_password.is_some()
    }
}

impl Config {
    /// Preset for `device.kind` with `[filter]`, `[capture]` and `[auth]` overrides applied.
    pub fn effective(&self) -> Effective {
        let p = Preset::for_kind(self.device.kind);
        Effective {
            min_delta_g: self.filter.min_delta_g.unwrap_or(p.min_delta_g),
            debounce_ms: self.filter.debounce_ms.unwrap_or(p.debounce_ms),
            photo_threshold: self.capture.photo_threshold.unwrap_or(p.photo_threshold),
            auth_deadline_ms: self.auth.deadline_ms.unwrap_or(p.auth_deadline_ms),
        }
    }

    /// Database root, environment first.
    pub fn database_url(&self, creds: &Credentials) -> Option<String> {
        creds
            .database_url
            .clone()
            .or_else(|| self.remote.database_url.clone())
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.tick_ms == 0 {
            eyre::bail!("device.tick_ms must be >= 1");
        }
        if self.device.tick_ms > 60_000 {
            eyre::bail!("device.tick_ms is unreasonably large (>60s)");
        }

        // Per-kind sensor settings
        match self.device.kind {
            DeviceKind::Potentiometer => {
                let p = &self.potentiometer;
                if p.adc_max == 0 {
                    eyre::bail!("potentiometer.adc_max must be > 0");
                }
                if !(p.max_weight_g > p.min_weight_g) {
                    eyre::bail!("potentiometer.max_weight_g must be > min_weight_g");
                }
            }
            DeviceKind::Button => {
                let b = &self.button;
                if !(b.increment_g > 0.0) {
                    eyre::bail!("button.increment_g must be > 0");
                }
                if !(b.max_weight_g > 0.0) {
                    eyre::bail!("button.max_weight_g must be > 0");
                }
                if b.debounce_ms > 5_000 {
                    eyre::bail!("button.debounce_ms is unreasonably large (>5s)");
                }
            }
            DeviceKind::LoadCell => {
                let l = &self.load_cell;
                if l.samples == 0 {
                    eyre::bail!("load_cell.samples must be >= 1");
                }
                if l.tare_samples == 0 {
                    eyre::bail!("load_cell.tare_samples must be >= 1");
                }
                if !l.scale_factor.is_finite() || l.scale_factor == 0.0 {
                    eyre::bail!("load_cell.scale_factor must be finite and non-zero");
                }
                if !(25..=27).contains(&l.gain_pulses) {
                    eyre::bail!("load_cell.gain_pulses must be 25, 26 or 27");
                }
            }
        }

        // Filter
        if let Some(d) = self.filter.min_delta_g
            && !(d >= 0.0 && d.is_finite())
        {
            eyre::bail!("filter.min_delta_g must be >= 0");
        }
        if let Some(ms) = self.filter.debounce_ms
            && ms > 60_000
        {
            eyre::bail!("filter.debounce_ms is unreasonably large (>60s)");
        }

        // Capture
        if let Some(PhotoThreshold::Grams(g)) = self.capture.photo_threshold
            && !(g > 0.0 && g.is_finite())
        {
            eyre::bail!("capture.photo_threshold must be > 0 grams or \"every_change\"");
        }
        let url = self.capture.endpoint_url.trim();
        if url.is_empty() {
            eyre::bail!("capture.endpoint_url must be set");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            eyre::bail!("capture.endpoint_url must start with http:// or https://");
        }
        if self.capture.flush_frames > 10 {
            eyre::bail!("capture.flush_frames must be in [0, 10]");
        }
        if self.capture.flush_settle_ms > 1_000 {
            eyre::bail!("capture.flush_settle_ms must be <= 1000");
        }
        if !(100..=120_000).contains(&self.capture.upload_timeout_ms) {
            eyre::bail!("capture.upload_timeout_ms must be in [100, 120000]");
        }

        // Camera
        if self.camera.jpeg_quality > 63 {
            eyre::bail!("camera.jpeg_quality must be in [0, 63]");
        }
        if self.camera.frame_buffers == 0 {
            eyre::bail!("camera.frame_buffers must be >= 1");
        }

        // Remote
        if !self.remote.weight_path.starts_with('/') {
            eyre::bail!("remote.weight_path must start with '/'");
        }

        // Auth
        if let Some(ms) = self.auth.deadline_ms
            && ms == 0
        {
            eyre::bail!("auth.deadline_ms must be >= 1");
        }
        if self.auth.poll_interval_ms == 0 {
            eyre::bail!("auth.poll_interval_ms must be >= 1");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[capture]
endpoint_url = "https://example.invalid/api/analyze-food"
"#;

    #[test]
    fn minimal_config_uses_potentiometer_preset() {
        let cfg = load_toml(MINIMAL).unwrap();
        cfg.validate().unwrap();
        let eff = cfg.effective();
        assert_eq!(eff.min_delta_g, 0.5);
        assert_eq!(eff.debounce_ms, 0);
        assert_eq!(eff.photo_threshold, PhotoThreshold::Grams(5.0));
        assert_eq!(eff.auth_deadline_ms, 120_000);
        assert_eq!(cfg.remote.weight_path, "/scale/weight");
    }

    #[test]
    fn photo_threshold_accepts_keyword_and_number() {
        let kw = load_toml(
            r#"
[capture]
endpoint_url = "http://x"
photo_threshold = "every_change"
"#,
        )
        .unwrap();
        assert_eq!(kw.capture.photo_threshold, Some(PhotoThreshold::EveryChange));

        let num = load_toml(
            r#"
[capture]
endpoint_url = "http://x"
photo_threshold = 12.5
"#,
        )
        .unwrap();
        assert_eq!(num.capture.photo_threshold, Some(PhotoThreshold::Grams(12.5)));
    }

    #[test]
    fn photo_threshold_rejects_unknown_keyword() {
        let err = load_toml(
            r#"
[capture]
endpoint_url = "http://x"
photo_threshold = "sometimes"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("every_change"));
    }

    #[test]
    fn credentials_ignore_blank_values_and_redact() {
        let creds = Credentials::from_lookup(|k| match k {
            "DATABASE_URL" => Some("https://db.example".into()),
            "API_KEY" => Some("secret-key".into()),
            "USER_EMAIL" => Some("   ".into()),
            _ => None,
        });
        assert_eq!(creds.database_url.as_deref(), Some("https://db.example"));
        assert!(creds.user_email.is_none());
        assert!(!creds.has_user_auth());
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret-key"));
    }

    #[test]
    fn env_database_url_wins_over_file() {
        let mut cfg = load_toml(MINIMAL).unwrap();
        cfg.remote.database_url = Some("https://file.example".into());
        let none = Credentials::default();
        assert_eq!(cfg.database_url(&none).as_deref(), Some("https://file.example"));
        let env = Credentials {
            database_url: Some("https://env.example".into()),
            ..Credentials::default()
        };
        assert_eq!(cfg.database_url(&env).as_deref(), Some("https://env.example"));
    }
}
