//! Type-state builder for `Device`.
//!
//! `build()` only exists once the source, camera, HTTP transport, database
//! and auth session have all been supplied.

use std::rc::Rc;

use scalecam_traits::{
    AuthSession, Camera, Clock, HttpTransport, RealtimeDb, StatusDisplay, SystemClock,
};
use scalecam_ui::LogDisplay;

use crate::auth::AuthGate;
use crate::config::{DeviceSettings, PhotoThreshold};
use crate::device::Device;
use crate::error::{BuildError, Result};
use crate::filter::ChangeFilter;
use crate::pipeline::CapturePipeline;
use crate::publisher::RemotePublisher;
use crate::source::WeightSource;
use crate::status::RunStats;
use crate::trigger::CaptureTrigger;

// ── Type-state marker ────────────────────────────────────────────────────────

/// Placeholder for a collaborator not yet supplied.
pub struct Missing;

pub struct DeviceBuilder<S, C, H, D, A> {
    source: S,
    camera: C,
    http: H,
    db: D,
    auth: A,
    display: Option<Box<dyn StatusDisplay>>,
    clock: Option<Rc<dyn Clock>>,
    settings: DeviceSettings,
}

impl DeviceBuilder<Missing, Missing, Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            source: Missing,
            camera: Missing,
            http: Missing,
            db: Missing,
            auth: Missing,
            display: None,
            clock: None,
            settings: DeviceSettings::default(),
        }
    }
}

impl Default for DeviceBuilder<Missing, Missing, Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C, H, D, A> DeviceBuilder<S, C, H, D, A> {
    pub fn with_source<S2: WeightSource>(self, source: S2) -> DeviceBuilder<S2, C, H, D, A> {
        DeviceBuilder {
            source,
            camera: self.camera,
            http: self.http,
            db: self.db,
            auth: self.auth,
            display: self.display,
            clock: self.clock,
            settings: self.settings,
        }
    }

    pub fn with_camera<C2: Camera>(self, camera: C2) -> DeviceBuilder<S, C2, H, D, A> {
        DeviceBuilder {
            source: self.source,
            camera,
            http: self.http,
            db: self.db,
            auth: self.auth,
            display: self.display,
            clock: self.clock,
            settings: self.settings,
        }
    }

    pub fn with_http<H2: HttpTransport>(self, http: H2) -> DeviceBuilder<S, C, H2, D, A> {
        DeviceBuilder {
            source: self.source,
            camera: self.camera,
            http,
            db: self.db,
            auth: self.auth,
            display: self.display,
            clock: self.clock,
            settings: self.settings,
        }
    }

    pub fn with_db<D2: RealtimeDb>(self, db: D2) -> DeviceBuilder<S, C, H, D2, A> {
        DeviceBuilder {
            source: self.source,
            camera: self.camera,
            http: self.http,
            db,
            auth: self.auth,
            display: self.display,
            clock: self.clock,
            settings: self.settings,
        }
    }

    pub fn with_auth<A2: AuthSession>(self, auth: A2) -> DeviceBuilder<S, C, H, D, A2> {
        DeviceBuilder {
            source: self.source,
            camera: self.camera,
            http: self.http,
            db: self.db,
            auth,
            display: self.display,
            clock: self.clock,
            settings: self.settings,
        }
    }

    pub fn with_display(mut self, display: impl StatusDisplay + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    /// Clock shared with the sources; defaults to `SystemClock`.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_settings(mut self, settings: DeviceSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl<S, C, H, D, A> DeviceBuilder<S, C, H, D, A>
where
    S: WeightSource,
    C: Camera,
    H: HttpTransport,
    D: RealtimeDb,
    A: AuthSession,
{
    pub fn build(self) -> Result<Device<S, C, H, D, A>> {
        validate(&self.settings).map_err(eyre::Report::new)?;

        let clock = self.clock.unwrap_or_else(|| Rc::new(SystemClock::new()));
        let s = self.settings;
        Ok(Device {
            source: self.source,
            filter: ChangeFilter::new(s.filter),
            trigger: CaptureTrigger::new(s.trigger),
            pipeline: CapturePipeline::new(self.camera, self.http, s.pipeline, Rc::clone(&clock)),
            publisher: RemotePublisher::new(self.db, &s.remote),
            auth: AuthGate::new(self.auth, &s.auth, Rc::clone(&clock)),
            auth_deadline: s.auth.deadline,
            display: self.display.unwrap_or_else(|| Box::new(LogDisplay)),
            clock,
            run_cfg: s.run,
            stats: RunStats::default(),
            read_error_shown: false,
        })
    }
}

fn validate(s: &DeviceSettings) -> std::result::Result<(), BuildError> {
    if !(s.filter.min_delta_g.is_finite() && s.filter.min_delta_g >= 0.0) {
        return Err(BuildError::InvalidConfig("min_delta_g must be >= 0"));
    }
    if let PhotoThreshold::Grams(g) = s.trigger.photo_threshold
        && !(g.is_finite() && g > 0.0)
    {
        return Err(BuildError::InvalidConfig("photo threshold must be > 0 grams"));
    }
    let url = s.pipeline.endpoint_url.trim();
    if url.is_empty() {
        return Err(BuildError::InvalidConfig("endpoint_url must be set"));
    }
    if s.pipeline.flush_frames > 10 {
        return Err(BuildError::InvalidConfig("flush_frames must be <= 10"));
    }
    if s.auth.deadline.is_zero() {
        return Err(BuildError::InvalidConfig("auth deadline must be >= 1 ms"));
    }
    if s.auth.poll_interval.is_zero() {
        return Err(BuildError::InvalidConfig("auth poll interval must be >= 1 ms"));
    }
    if !s.remote.weight_path.starts_with('/') {
        return Err(BuildError::InvalidConfig("weight_path must start with '/'"));
    }
    if s.run.tick.is_zero() {
        return Err(BuildError::InvalidConfig("tick must be >= 1 ms"));
    }
    Ok(())
}
