//! Driver selection and device assembly from config and the environment.
//!
//! Uploads go to `capture.endpoint_url` over HTTP unless
//! `SCALECAM_SIM_HTTP_CODE` selects the simulated endpoint. Camera, database
//! and auth are simulated on every build; the weight source uses real GPIO
//! drivers when built with `--features hardware`. The other `SCALECAM_SIM_*`
//! variables steer the simulators for demos and tests.

use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

use scalecam_config::{Config, Credentials, DeviceKind, LoadCellCalibration};
use scalecam_core::{
    AnySource, ButtonSource, Calibration, Device, DeviceSettings, LoadCellSource,
    PotentiometerSource, ScaleError,
};
use scalecam_hardware::{
    HttpClient, SimulatedAuth, SimulatedCamera, SimulatedDb, SimulatedHttp, SimulatedPot,
};
use scalecam_traits::{AnalogInput, Clock, HttpResponse, HttpTransport, RemoteError, StatusDisplay};
use scalecam_ui::{LogDisplay, TextDisplay};

pub type CliDevice =
    Device<AnySource, SimulatedCamera, UploadTransport, SimulatedDb, SimulatedAuth>;

/// Where captured photos are POSTed.
pub enum UploadTransport {
    Live(HttpClient),
    Simulated(SimulatedHttp),
}

impl HttpTransport for UploadTransport {
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> HttpResponse {
        match self {
            Self::Live(c) => c.post(url, content_type, body),
            Self::Simulated(c) => c.post(url, content_type, body),
        }
    }
}

/// Raw counts the simulated load cell reports with an empty platform.
#[cfg(not(feature = "hardware"))]
const SIM_ZERO_COUNTS: i32 = 84_000;

/// Simulator knobs read from `SCALECAM_SIM_*`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimKnobs {
    /// Grams the simulated weight grows by per read.
    pub step_g: f32,
    /// Status code the simulated upload endpoint answers with; unset uploads for real.
    pub http_code: Option<i32>,
    /// `init`, `capture` or `empty`.
    pub camera_fault: Option<String>,
    /// Session steps before auth is ready; `None` means stuck.
    pub auth_steps: Option<u32>,
    pub db_fail: bool,
}

impl Default for SimKnobs {
    fn default() -> Self {
        Self {
            step_g: 0.0,
            http_code: None,
            camera_fault: None,
            auth_steps: Some(0),
            db_fail: false,
        }
    }
}

impl SimKnobs {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            step_g: lookup("SCALECAM_SIM_STEP_G")
                .and_then(|v| parse_trimmed::<f32>(&v))
                .unwrap_or(d.step_g),
            http_code: lookup("SCALECAM_SIM_HTTP_CODE")
                .and_then(|v| parse_trimmed::<i32>(&v))
                .or(d.http_code),
            camera_fault: lookup("SCALECAM_SIM_CAMERA_FAIL")
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty()),
            auth_steps: match lookup("SCALECAM_SIM_AUTH_STEPS") {
                Some(v) if v.trim().eq_ignore_ascii_case("stuck") => None,
                Some(v) => parse_trimmed(&v).or(d.auth_steps),
                None => d.auth_steps,
            },
            db_fail: lookup("SCALECAM_SIM_DB_FAIL").is_some_and(|v| v.trim() == "1"),
        }
    }
}

fn parse_trimmed<T: FromStr>(v: &str) -> Option<T> {
    v.trim().parse().ok()
}

/// Pick and initialize the weight source for `[device] kind`.
///
/// A load cell without a persisted or CSV calibration is tared here, so the
/// platform must be empty at startup.
pub fn build_source(
    cfg: &Config,
    calibration: Option<LoadCellCalibration>,
    knobs: &SimKnobs,
    clock: &Rc<dyn Clock>,
) -> Result<AnySource, ScaleError> {
    let source = match cfg.device.kind {
        DeviceKind::Potentiometer => {
            let pot = &cfg.potentiometer;
            if cfg.pins.potentiometer.is_some() {
                tracing::warn!("no ADC driver on this host; potentiometer is simulated");
            }
            let span = pot.max_weight_g - pot.min_weight_g;
            let codes_per_gram = f32::from(pot.adc_max) / span;
            let adc: Box<dyn AnalogInput> =
                Box::new(SimulatedPot::new(0, knobs.step_g * codes_per_gram));
            AnySource::Potentiometer(PotentiometerSource::new(
                adc,
                pot.into(),
                Rc::clone(clock),
            ))
        }
        DeviceKind::Button => {
            let input = open_button(cfg, knobs)?;
            AnySource::Button(ButtonSource::new(
                input,
                (&cfg.button).into(),
                Rc::clone(clock),
            ))
        }
        DeviceKind::LoadCell => {
            let lc = &cfg.load_cell;
            let (cal, needs_tare) = match calibration.or(cfg.calibration) {
                Some(c) => (Calibration::from(&c), false),
                None => (
                    Calibration {
                        scale_factor: lc.scale_factor,
                        zero_counts: 0,
                    },
                    true,
                ),
            };
            let adc = open_load_cell(cfg, knobs)?;
            let mut source = LoadCellSource::new(adc, lc.into(), cal, Rc::clone(clock));
            if needs_tare {
                let zero = source.tare()?;
                tracing::info!(zero_counts = zero, "startup tare");
            }
            AnySource::LoadCell(source)
        }
    };
    Ok(source)
}

#[cfg(feature = "hardware")]
fn open_button(
    cfg: &Config,
    _knobs: &SimKnobs,
) -> Result<Box<dyn scalecam_traits::DigitalInput>, ScaleError> {
    let pin = cfg
        .pins
        .button
        .ok_or_else(|| ScaleError::Config("pins.button is missing".into()))?;
    let button = scalecam_hardware::GpioButton::open(pin)
        .map_err(|e| scalecam_core::hw_error::map_hw_error(&e))?;
    Ok(Box::new(button))
}

#[cfg(not(feature = "hardware"))]
fn open_button(
    cfg: &Config,
    knobs: &SimKnobs,
) -> Result<Box<dyn scalecam_traits::DigitalInput>, ScaleError> {
    // Hold each level long enough for the debouncer to confirm it.
    let button = if knobs.step_g > 0.0 {
        let hold = (cfg.button.debounce_ms / cfg.device.tick_ms.max(1)) as usize + 2;
        scalecam_hardware::SimulatedButton::presses(10_000, hold)
    } else {
        scalecam_hardware::SimulatedButton::from_levels(Vec::<bool>::new())
    };
    Ok(Box::new(button))
}

#[cfg(feature = "hardware")]
fn open_load_cell(
    cfg: &Config,
    _knobs: &SimKnobs,
) -> Result<Box<dyn scalecam_traits::LoadCellAdc>, ScaleError> {
    let (Some(dt), Some(sck)) = (cfg.pins.hx711_dt, cfg.pins.hx711_sck) else {
        return Err(ScaleError::Config(
            "pins.hx711_dt and pins.hx711_sck are missing".into(),
        ));
    };
    let hx = scalecam_hardware::hx711::Hx711::open(dt, sck, cfg.load_cell.gain_pulses)
        .map_err(|e| scalecam_core::hw_error::map_hw_error(&e))?;
    Ok(Box::new(hx))
}

#[cfg(not(feature = "hardware"))]
fn open_load_cell(
    cfg: &Config,
    knobs: &SimKnobs,
) -> Result<Box<dyn scalecam_traits::LoadCellAdc>, ScaleError> {
    let counts_per_gram = 1.0 / cfg.load_cell.scale_factor;
    Ok(Box::new(
        scalecam_hardware::SimulatedLoadCell::new(SIM_ZERO_COUNTS, counts_per_gram).with_step(knobs.step_g),
    ))
}

pub fn build_camera(knobs: &SimKnobs) -> SimulatedCamera {
    let camera = SimulatedCamera::new();
    match knobs.camera_fault.as_deref() {
        Some("init") => camera.failing_init(),
        Some("capture") => camera.failing(),
        Some("empty") => camera.empty_frames(),
        _ => camera,
    }
}

pub fn build_http(cfg: &Config, knobs: &SimKnobs) -> UploadTransport {
    match knobs.http_code {
        Some(code) => {
            tracing::info!(code, "simulated upload endpoint");
            UploadTransport::Simulated(SimulatedHttp::responding(code))
        }
        None => UploadTransport::Live(HttpClient::new(Duration::from_millis(
            cfg.capture.upload_timeout_ms,
        ))),
    }
}

pub fn build_db(cfg: &Config, creds: &Credentials, knobs: &SimKnobs) -> SimulatedDb {
    match cfg.database_url(creds) {
        Some(url) => tracing::info!(database_url = %url, "realtime database configured"),
        None => tracing::warn!("no database URL set; weights stay local"),
    }
    let db = SimulatedDb::new();
    if knobs.db_fail {
        db.failing(RemoteError::new(-1, "connection refused"))
    } else {
        db
    }
}

pub fn build_auth(creds: &Credentials, knobs: &SimKnobs) -> SimulatedAuth {
    if !creds.has_user_auth() {
        tracing::info!("no user credentials; skipping sign-in");
        return SimulatedAuth::uninitialized();
    }
    match knobs.auth_steps {
        Some(n) => SimulatedAuth::after_steps(n),
        None => SimulatedAuth::stuck(),
    }
}

/// Full device: source, simulated remotes and a display on stderr (or the log in JSON mode).
pub fn build_device(
    cfg: &Config,
    calibration: Option<LoadCellCalibration>,
    creds: &Credentials,
    knobs: &SimKnobs,
    clock: Rc<dyn Clock>,
    json: bool,
) -> eyre::Result<CliDevice> {
    let source = build_source(cfg, calibration, knobs, &clock)?;
    let display: Box<dyn StatusDisplay> = if json {
        Box::new(LogDisplay)
    } else {
        Box::new(TextDisplay::new(std::io::stderr()))
    };
    Device::builder()
        .with_source(source)
        .with_camera(build_camera(knobs))
        .with_http(build_http(cfg, knobs))
        .with_db(build_db(cfg, creds, knobs))
        .with_auth(build_auth(creds, knobs))
        .with_display(display)
        .with_clock(clock)
        .with_settings(DeviceSettings::from(cfg))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalecam_core::WeightSource;
    use scalecam_traits::ManualClock;

    fn cfg(extra: &str) -> Config {
        scalecam_config::load_toml(&format!(
            "{extra}\n[capture]\nendpoint_url = \"http://localhost:3000/api/analyze-food\"\n"
        ))
        .unwrap()
    }

    fn clock() -> Rc<dyn Clock> {
        Rc::new(ManualClock::new())
    }

    #[test]
    fn knobs_parse_from_lookup() {
        let k = SimKnobs::from_lookup(|key| match key {
            "SCALECAM_SIM_STEP_G" => Some(" 6.5 ".into()),
            "SCALECAM_SIM_HTTP_CODE" => Some("-11".into()),
            "SCALECAM_SIM_CAMERA_FAIL" => Some("Init".into()),
            "SCALECAM_SIM_AUTH_STEPS" => Some("stuck".into()),
            _ => None,
        });
        assert_eq!(k.step_g, 6.5);
        assert_eq!(k.http_code, Some(-11));
        assert_eq!(k.camera_fault.as_deref(), Some("init"));
        assert_eq!(k.auth_steps, None);
        assert!(!k.db_fail);
    }

    #[test]
    fn bad_knob_values_fall_back_to_defaults() {
        let k = SimKnobs::from_lookup(|key| match key {
            "SCALECAM_SIM_STEP_G" => Some("lots".into()),
            "SCALECAM_SIM_AUTH_STEPS" => Some("-3".into()),
            _ => None,
        });
        assert_eq!(k, SimKnobs::default());
    }

    #[test]
    fn simulated_pot_steps_in_grams() {
        let knobs = SimKnobs {
            step_g: 50.0,
            ..SimKnobs::default()
        };
        let mut src = build_source(&cfg(""), None, &knobs, &clock()).unwrap();
        assert_eq!(src.kind(), "potentiometer");
        assert_eq!(src.read().grams, 0.0);
        let second = src.read().grams;
        assert!((second - 50.0).abs() < 0.2, "got {second}");
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn load_cell_without_calibration_is_tared() {
        let c = cfg("[device]\nkind = \"load_cell\"\n[load_cell]\nscale_factor = 0.01");
        let mut src = build_source(&c, None, &SimKnobs::default(), &clock()).unwrap();
        let AnySource::LoadCell(lc) = &mut src else {
            panic!("expected load cell");
        };
        assert_eq!(lc.calibration().zero_counts, SIM_ZERO_COUNTS);
        assert_eq!(src.read().grams, 0.0);
    }

    #[cfg(not(feature = "hardware"))]
    #[test]
    fn explicit_calibration_skips_tare() {
        let c = cfg("[device]\nkind = \"load_cell\"");
        let cal = LoadCellCalibration {
            scale_factor: 0.5,
            zero_counts: 1234,
        };
        let src = build_source(&c, Some(cal), &SimKnobs::default(), &clock()).unwrap();
        let AnySource::LoadCell(lc) = &src else {
            panic!("expected load cell");
        };
        assert_eq!(lc.calibration().zero_counts, 1234);
    }

    #[test]
    fn upload_is_live_unless_code_is_simulated() {
        let c = cfg("");
        assert!(matches!(
            build_http(&c, &SimKnobs::default()),
            UploadTransport::Live(_)
        ));
        let knobs = SimKnobs {
            http_code: Some(201),
            ..SimKnobs::default()
        };
        let UploadTransport::Simulated(mut sim) = build_http(&c, &knobs) else {
            panic!("expected simulated upload");
        };
        assert_eq!(sim.post("http://x", "image/jpeg", &[1]).code, 201);
    }

    #[test]
    fn auth_is_uninitialized_without_credentials() {
        use scalecam_traits::AuthSession;
        let auth = build_auth(&Credentials::default(), &SimKnobs::default());
        assert!(!auth.is_initialized());

        let creds = Credentials {
            api_key: Some("k".into()),
            user_email: Some("a@b".into()),
            user_password: Some("p".into()),
            ..Credentials::default()
        };
        assert!(build_auth(&creds, &SimKnobs::default()).is_ready());
    }
}
