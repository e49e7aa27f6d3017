//! Simulated collaborators for host runs and tests.
//!
//! Each simulator keeps its observable state behind `Rc` handles so a test
//! (or the CLI summary) can inspect what the control loop did after the
//! simulator has been moved into the device.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use scalecam_traits::{
    AnalogInput, AuthSession, BoxError, Camera, CameraSettings, DigitalInput, HttpResponse,
    HttpTransport, LoadCellAdc, RealtimeDb, RemoteError,
};

use crate::error::HwError;

/// Potentiometer wiper that drifts by `step` codes per read.
pub struct SimulatedPot {
    code: f32,
    step: f32,
    fail: bool,
}

impl SimulatedPot {
    pub fn new(start_code: u16, step: f32) -> Self {
        Self {
            code: f32::from(start_code),
            step,
            fail: false,
        }
    }

    /// Every read fails, as if the ADC were disconnected.
    pub fn failing() -> Self {
        Self {
            code: 0.0,
            step: 0.0,
            fail: true,
        }
    }
}

impl AnalogInput for SimulatedPot {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        if self.fail {
            return Err(Box::new(HwError::Analog("simulated adc fault".into())));
        }
        let v = self.code.clamp(0.0, f32::from(u16::MAX)) as u16;
        self.code += self.step;
        tracing::trace!(code = v, "simulated pot read");
        Ok(v)
    }
}

/// Button driven by a scripted list of levels; repeats the last level when exhausted.
pub struct SimulatedButton {
    script: VecDeque<bool>,
    last: bool,
}

impl SimulatedButton {
    pub fn from_levels(levels: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: levels.into_iter().collect(),
            last: false,
        }
    }

    /// `presses` full press/release cycles, each level held for `hold_reads` reads.
    pub fn presses(presses: usize, hold_reads: usize) -> Self {
        let mut levels = Vec::with_capacity(presses * hold_reads * 2);
        for _ in 0..presses {
            levels.extend(std::iter::repeat_n(true, hold_reads));
            levels.extend(std::iter::repeat_n(false, hold_reads));
        }
        Self::from_levels(levels)
    }
}

impl DigitalInput for SimulatedButton {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        if let Some(level) = self.script.pop_front() {
            self.last = level;
        }
        Ok(self.last)
    }
}

/// HX711 stand-in. The load grows by `step_g` each time a conversion becomes ready.
pub struct SimulatedLoadCell {
    grams: f32,
    step_g: f32,
    counts_per_gram: f32,
    zero_counts: i32,
    not_ready_left: u32,
}

impl SimulatedLoadCell {
    pub fn new(zero_counts: i32, counts_per_gram: f32) -> Self {
        Self {
            grams: 0.0,
            step_g: 0.0,
            counts_per_gram,
            zero_counts,
            not_ready_left: 0,
        }
    }

    pub fn with_step(mut self, step_g: f32) -> Self {
        self.step_g = step_g;
        self
    }

    pub fn with_load(mut self, grams: f32) -> Self {
        self.grams = grams;
        self
    }

    /// Report "not ready" for the next `n` polls.
    pub fn not_ready_for(mut self, n: u32) -> Self {
        self.not_ready_left = n;
        self
    }
}

impl LoadCellAdc for SimulatedLoadCell {
    fn is_ready(&mut self) -> bool {
        if self.not_ready_left > 0 {
            self.not_ready_left -= 1;
            return false;
        }
        self.grams += self.step_g;
        true
    }

    fn read_raw(&mut self) -> Result<i32, BoxError> {
        let counts = self.zero_counts as f32 + self.grams * self.counts_per_gram;
        Ok(counts.round() as i32)
    }
}

/// Frame produced by `SimulatedCamera`: a JPEG-framed payload tagged with a sequence number.
#[derive(Debug, Clone)]
pub struct SimFrame {
    pub seq: u32,
    data: Vec<u8>,
}

impl AsRef<[u8]> for SimFrame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Frame-buffer bookkeeping shared between a `SimulatedCamera` and its observers.
#[derive(Debug, Default)]
pub struct CameraCounters {
    pub acquired: Cell<u32>,
    pub released: Cell<u32>,
    pub max_outstanding: Cell<u32>,
}

impl CameraCounters {
    pub fn outstanding(&self) -> u32 {
        self.acquired.get().saturating_sub(self.released.get())
    }
}

pub struct SimulatedCamera {
    settings: Option<CameraSettings>,
    fail_init: bool,
    fail_capture: bool,
    empty_frames: bool,
    seq: u32,
    counters: Rc<CameraCounters>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self {
            settings: None,
            fail_init: false,
            fail_capture: false,
            empty_frames: false,
            seq: 0,
            counters: Rc::new(CameraCounters::default()),
        }
    }

    /// `acquire` always returns `None`.
    pub fn failing(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    /// `acquire` returns zero-length frames.
    pub fn empty_frames(mut self) -> Self {
        self.empty_frames = true;
        self
    }

    /// `init` fails and, like a driver that never came up, `acquire` returns `None`.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn counters(&self) -> Rc<CameraCounters> {
        Rc::clone(&self.counters)
    }

    fn payload_len(&self) -> usize {
        let (w, h) = self
            .settings
            .map(|s| s.frame_size.dimensions())
            .unwrap_or((320, 240));
        // Rough compressed size; only the length matters to the transport.
        ((w * h) / 40) as usize
    }
}

impl Camera for SimulatedCamera {
    type Frame = SimFrame;

    fn init(&mut self, settings: &CameraSettings) -> Result<(), BoxError> {
        if self.fail_init {
            return Err(Box::new(HwError::Camera("sensor not detected".into())));
        }
        self.settings = Some(*settings);
        Ok(())
    }

    fn acquire(&mut self) -> Option<SimFrame> {
        if self.fail_capture || self.fail_init {
            return None;
        }
        self.seq = self.seq.wrapping_add(1);
        let data = if self.empty_frames {
            Vec::new()
        } else {
            let mut d = vec![0u8; self.payload_len().max(4)];
            let n = d.len();
            d[0] = 0xFF;
            d[1] = 0xD8;
            d[n - 2] = 0xFF;
            d[n - 1] = 0xD9;
            d
        };
        let c = &self.counters;
        c.acquired.set(c.acquired.get() + 1);
        c.max_outstanding
            .set(c.max_outstanding.get().max(c.outstanding()));
        Some(SimFrame {
            seq: self.seq,
            data,
        })
    }

    fn release(&mut self, frame: SimFrame) {
        tracing::trace!(seq = frame.seq, "simulated frame released");
        let c = &self.counters;
        c.released.set(c.released.get() + 1);
    }
}

/// One recorded POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub url: String,
    pub content_type: String,
    pub len: usize,
}

/// Upload endpoint that answers every POST with a fixed code.
pub struct SimulatedHttp {
    code: i32,
    posts: Rc<RefCell<Vec<PostRecord>>>,
}

impl SimulatedHttp {
    pub fn responding(code: i32) -> Self {
        Self {
            code,
            posts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn posts(&self) -> Rc<RefCell<Vec<PostRecord>>> {
        Rc::clone(&self.posts)
    }
}

impl HttpTransport for SimulatedHttp {
    fn post(&mut self, url: &str, content_type: &str, body: &[u8]) -> HttpResponse {
        self.posts.borrow_mut().push(PostRecord {
            url: url.to_string(),
            content_type: content_type.to_string(),
            len: body.len(),
        });
        if self.code <= 0 {
            return HttpResponse::transport_error(self.code);
        }
        HttpResponse {
            code: self.code,
            body: format!("{{\"received\":{}}}", body.len()),
        }
    }
}

/// In-memory realtime database.
pub struct SimulatedDb {
    values: Rc<RefCell<HashMap<String, f32>>>,
    writes: Rc<Cell<u32>>,
    fail: Option<RemoteError>,
}

impl Default for SimulatedDb {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDb {
    pub fn new() -> Self {
        Self {
            values: Rc::new(RefCell::new(HashMap::new())),
            writes: Rc::new(Cell::new(0)),
            fail: None,
        }
    }

    /// Every write fails with the given error.
    pub fn failing(mut self, err: RemoteError) -> Self {
        self.fail = Some(err);
        self
    }

    pub fn values(&self) -> Rc<RefCell<HashMap<String, f32>>> {
        Rc::clone(&self.values)
    }

    pub fn writes(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.writes)
    }
}

impl RealtimeDb for SimulatedDb {
    fn set_f32(&mut self, path: &str, value: f32) -> Result<(), RemoteError> {
        self.writes.set(self.writes.get() + 1);
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        self.values.borrow_mut().insert(path.to_string(), value);
        Ok(())
    }
}

/// Auth session that becomes ready after a fixed number of `step` calls.
pub struct SimulatedAuth {
    initialized: bool,
    steps_needed: u32,
    steps: Rc<Cell<u32>>,
}

impl SimulatedAuth {
    pub fn ready() -> Self {
        Self::after_steps(0)
    }

    pub fn after_steps(steps_needed: u32) -> Self {
        Self {
            initialized: true,
            steps_needed,
            steps: Rc::new(Cell::new(0)),
        }
    }

    /// Never becomes ready.
    pub fn stuck() -> Self {
        Self::after_steps(u32::MAX)
    }

    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            ..Self::after_steps(0)
        }
    }

    pub fn steps(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.steps)
    }
}

impl AuthSession for SimulatedAuth {
    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn is_ready(&self) -> bool {
        self.initialized && self.steps.get() >= self.steps_needed
    }

    fn step(&mut self) {
        self.steps.set(self.steps.get().saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_counts_acquire_and_release() {
        let mut cam = SimulatedCamera::new();
        cam.init(&CameraSettings::default()).unwrap();
        let counters = cam.counters();
        let f = cam.acquire().unwrap();
        assert_eq!(&f.as_ref()[..2], &[0xFF, 0xD8]);
        assert_eq!(counters.outstanding(), 1);
        cam.release(f);
        assert_eq!(counters.outstanding(), 0);
        assert_eq!(counters.max_outstanding.get(), 1);
    }

    #[test]
    fn button_repeats_last_level() {
        let mut b = SimulatedButton::from_levels([true, false]);
        assert!(b.is_high().unwrap());
        assert!(!b.is_high().unwrap());
        assert!(!b.is_high().unwrap());
    }

    #[test]
    fn auth_ready_after_steps() {
        let mut a = SimulatedAuth::after_steps(2);
        assert!(!a.is_ready());
        a.step();
        a.step();
        assert!(a.is_ready());
        assert!(!SimulatedAuth::uninitialized().is_ready());
    }

    #[test]
    fn http_non_positive_code_has_empty_body() {
        let mut h = SimulatedHttp::responding(-1);
        let r = h.post("http://x", "image/jpeg", &[1, 2, 3]);
        assert_eq!(r.code, -1);
        assert!(r.body.is_empty());
        assert_eq!(h.posts().borrow().len(), 1);
    }
}
