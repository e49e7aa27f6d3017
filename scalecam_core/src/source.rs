//! Weight sources: potentiometer, debounced push button and load cell.
//!
//! Each source turns one driver read into a `WeightSample`. Driver failures
//! never escape as errors; they come back as an invalid sample so the loop
//! can report the tick and carry on.

use std::rc::Rc;
use std::time::{Duration, Instant};

use scalecam_traits::{AnalogInput, Clock, DigitalInput, LoadCellAdc};
use tracing::{debug, warn};

use crate::calibration::Calibration;
use crate::config::{ButtonCfg, LoadCellCfg, PotentiometerCfg};
use crate::error::ScaleError;
use crate::hw_error::map_hw_error;
use crate::sample::WeightSample;
use crate::util::grams_to_cg;

pub trait WeightSource {
    /// One reading. Never blocks longer than the driver's own read.
    fn read(&mut self) -> WeightSample;

    fn kind(&self) -> &'static str;
}

impl<T: WeightSource + ?Sized> WeightSource for Box<T> {
    fn read(&mut self) -> WeightSample {
        (**self).read()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

// ── Potentiometer ────────────────────────────────────────────────────────────

/// Maps the ADC code linearly onto `[min_weight_g, max_weight_g]` at centigram resolution.
pub struct PotentiometerSource<A> {
    adc: A,
    cfg: PotentiometerCfg,
    clock: Rc<dyn Clock>,
}

impl<A: AnalogInput> PotentiometerSource<A> {
    pub fn new(adc: A, cfg: PotentiometerCfg, clock: Rc<dyn Clock>) -> Self {
        Self { adc, cfg, clock }
    }

    /// Codes above `adc_max` are clamped to `adc_max`.
    pub fn grams_for_code(&self, code: u16) -> f32 {
        let max = self.cfg.adc_max.max(1);
        let code = i64::from(code.min(max));
        let lo = i64::from(grams_to_cg(self.cfg.min_weight_g));
        let hi = i64::from(grams_to_cg(self.cfg.max_weight_g));
        let cg = code * (hi - lo) / i64::from(max) + lo;
        cg as f32 / 100.0
    }
}

impl<A: AnalogInput> WeightSource for PotentiometerSource<A> {
    fn read(&mut self) -> WeightSample {
        let now = self.clock.now();
        match self.adc.read_raw() {
            Ok(code) => WeightSample::new(self.grams_for_code(code), now),
            Err(e) => {
                warn!(error = %map_hw_error(e.as_ref()), "potentiometer read failed");
                WeightSample::failed(now)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "potentiometer"
    }
}

// ── Button ───────────────────────────────────────────────────────────────────

/// Confirms a level change once it has held for `window`.
#[derive(Debug, Clone, Copy)]
struct EdgeDebouncer {
    window: Duration,
    last_stable: bool,
    current_raw: bool,
    raw_since: Option<Instant>,
}

impl EdgeDebouncer {
    fn new(window: Duration) -> Self {
        Self {
            window,
            last_stable: false, // pulled down, not pressed
            current_raw: false,
            raw_since: None,
        }
    }

    /// `Some(true)` on a confirmed press, `Some(false)` on a confirmed release.
    fn update(&mut self, level: bool, now: Instant) -> Option<bool> {
        if self.raw_since.is_none() || level != self.current_raw {
            self.current_raw = level;
            self.raw_since = Some(now);
        }
        if self.current_raw == self.last_stable {
            return None;
        }
        let held = self
            .raw_since
            .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
        if held >= self.window {
            self.last_stable = self.current_raw;
            Some(self.current_raw)
        } else {
            None
        }
    }
}

/// Accumulates `increment_g` per debounced edge, saturating at `max_weight_g`.
pub struct ButtonSource<I> {
    input: I,
    cfg: ButtonCfg,
    clock: Rc<dyn Clock>,
    debounce: EdgeDebouncer,
    grams: f32,
}

impl<I: DigitalInput> ButtonSource<I> {
    pub fn new(input: I, cfg: ButtonCfg, clock: Rc<dyn Clock>) -> Self {
        Self {
            input,
            debounce: EdgeDebouncer::new(cfg.debounce),
            cfg,
            clock,
            grams: 0.0,
        }
    }

    pub fn grams(&self) -> f32 {
        self.grams
    }
}

impl<I: DigitalInput> WeightSource for ButtonSource<I> {
    fn read(&mut self) -> WeightSample {
        let now = self.clock.now();
        let level = match self.input.is_high() {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %map_hw_error(e.as_ref()), "button read failed");
                return WeightSample::failed(now);
            }
        };
        if let Some(pressed) = self.debounce.update(level, now)
            && (pressed || self.cfg.release_adds)
        {
            self.grams = (self.grams + self.cfg.increment_g).min(self.cfg.max_weight_g);
            debug!(pressed, grams = self.grams, "button edge");
        }
        WeightSample::new(self.grams, now)
    }

    fn kind(&self) -> &'static str {
        "button"
    }
}

// ── Load cell ────────────────────────────────────────────────────────────────

/// Averages `samples` conversions per reading; negative weights read as zero.
pub struct LoadCellSource<A> {
    adc: A,
    cfg: LoadCellCfg,
    calibration: Calibration,
    clock: Rc<dyn Clock>,
}

impl<A: LoadCellAdc> LoadCellSource<A> {
    pub fn new(adc: A, cfg: LoadCellCfg, calibration: Calibration, clock: Rc<dyn Clock>) -> Self {
        Self {
            adc,
            cfg,
            calibration,
            clock,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    /// Average `tare_samples` conversions and make that the zero point.
    pub fn tare(&mut self) -> Result<i32, ScaleError> {
        let avg = self.average(self.cfg.tare_samples)?;
        let zero = avg.round() as i32;
        self.calibration.zero_counts = zero;
        debug!(zero_counts = zero, "load cell tared");
        Ok(zero)
    }

    fn average(&mut self, n: u8) -> Result<f64, ScaleError> {
        if !self.adc.is_ready() {
            return Err(ScaleError::SensorUnavailable("load cell not ready".into()));
        }
        let n = n.max(1);
        let mut sum: i64 = 0;
        for _ in 0..n {
            let raw = self.adc.read_raw().map_err(|e| map_hw_error(e.as_ref()))?;
            sum += i64::from(raw);
        }
        Ok(sum as f64 / f64::from(n))
    }
}

impl<A: LoadCellAdc> WeightSource for LoadCellSource<A> {
    fn read(&mut self) -> WeightSample {
        let now = self.clock.now();
        match self.average(self.cfg.samples) {
            Ok(avg) => WeightSample::new(self.calibration.grams(avg).max(0.0), now),
            Err(e) => {
                warn!(error = %e, "load cell read failed");
                WeightSample::failed(now)
            }
        }
    }

    fn kind(&self) -> &'static str {
        "load_cell"
    }
}

// ── Tagged variant ───────────────────────────────────────────────────────────

/// The source chosen at startup from `[device] kind`.
pub enum AnySource {
    Potentiometer(PotentiometerSource<Box<dyn AnalogInput>>),
    Button(ButtonSource<Box<dyn DigitalInput>>),
    LoadCell(LoadCellSource<Box<dyn LoadCellAdc>>),
}

impl WeightSource for AnySource {
    fn read(&mut self) -> WeightSample {
        match self {
            AnySource::Potentiometer(s) => s.read(),
            AnySource::Button(s) => s.read(),
            AnySource::LoadCell(s) => s.read(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AnySource::Potentiometer(s) => s.kind(),
            AnySource::Button(s) => s.kind(),
            AnySource::LoadCell(s) => s.kind(),
        }
    }
}
