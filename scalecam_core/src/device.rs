//! The device: one weight source, the change filter, the photo trigger and
//! the remote side, driven one tick at a time.

use std::rc::Rc;
use std::time::Duration;

use scalecam_traits::{
    AuthSession, Camera, Clock, HttpTransport, RealtimeDb, StatusDisplay,
};
use scalecam_ui::{Notice, PhotoNote};
use tracing::{debug, info, warn};

use crate::auth::{AuthGate, AuthStatus};
use crate::builder::{DeviceBuilder, Missing};
use crate::config::LoopCfg;
use crate::error::ScaleError;
use crate::filter::{ChangeFilter, WeightState};
use crate::pipeline::{CapturePipeline, UploadAck};
use crate::publisher::RemotePublisher;
use crate::source::WeightSource;
use crate::status::{RunStats, SetupReport, TickOutcome, TickReport};
use crate::trigger::{CaptureRequest, CaptureTrigger};

pub struct Device<S, C, H, D, A> {
    pub(crate) source: S,
    pub(crate) filter: ChangeFilter,
    pub(crate) trigger: CaptureTrigger,
    pub(crate) pipeline: CapturePipeline<C, H>,
    pub(crate) publisher: RemotePublisher<D>,
    pub(crate) auth: AuthGate<A>,
    pub(crate) auth_deadline: Duration,
    pub(crate) display: Box<dyn StatusDisplay>,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) run_cfg: LoopCfg,
    pub(crate) stats: RunStats,
    /// The display shows a read error rather than the weight.
    pub(crate) read_error_shown: bool,
}

impl<S, C, H, D, A> core::fmt::Debug for Device<S, C, H, D, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("filter", &self.filter.state())
            .field("trigger", &self.trigger.state())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Device<Missing, Missing, Missing, Missing, Missing> {
    /// Start building a Device.
    pub fn builder() -> DeviceBuilder<Missing, Missing, Missing, Missing, Missing> {
        DeviceBuilder::new()
    }
}

impl<S, C, H, D, A> Device<S, C, H, D, A>
where
    S: WeightSource,
    C: Camera,
    H: HttpTransport,
    D: RealtimeDb,
    A: AuthSession,
{
    /// Bring up the camera and wait once for the auth session.
    ///
    /// Failures are reported, not returned: the loop runs without a camera
    /// (captures fail) and keeps retrying auth every tick.
    pub fn setup(&mut self) -> SetupReport {
        self.display.show(Notice::Connecting.text(), "");
        let camera_error = match self.pipeline.init_camera() {
            Ok(()) => {
                self.display.show(Notice::CameraReady.text(), "");
                None
            }
            Err(e) => {
                self.display.show(Notice::CameraFailed.text(), "");
                Some(e)
            }
        };

        let auth = self.auth.ensure_ready(self.auth_deadline);
        match auth {
            AuthStatus::Ready => info!(source = self.source.kind(), "device ready"),
            AuthStatus::NotInitialized => {
                warn!("auth session not initialized; publishing unauthenticated");
            }
            AuthStatus::TimedOut { waited_ms } => {
                self.display.show(Notice::AuthTimeout.text(), "");
                warn!(waited_ms, "auth not ready at startup");
            }
        }
        SetupReport { camera_error, auth }
    }

    /// One pass of the control loop: auth, read, filter, publish, photo.
    pub fn tick(&mut self) -> TickReport {
        let auth = self.auth.ensure_ready(self.auth_deadline);
        if let AuthStatus::TimedOut { .. } = auth {
            self.display.show(Notice::AuthTimeout.text(), "");
        }
        self.publisher.service();

        let sample = self.source.read();
        if !sample.is_valid() {
            self.display.show(Notice::ReadError.text(), "");
            self.read_error_shown = true;
            let report = TickReport {
                auth,
                outcome: TickOutcome::SensorSkipped,
            };
            self.stats.record(&report);
            return report;
        }

        self.trigger.seed(sample.grams);
        if self.read_error_shown {
            self.read_error_shown = false;
            let line = scalecam_ui::weight_line(self.filter.state().last_accepted_g);
            self.display.show(&line, "");
        }

        let now = self.clock.now();
        let Some(event) = self.filter.accept(&sample, now) else {
            let report = TickReport {
                auth,
                outcome: TickOutcome::NoChange {
                    weight_g: sample.grams,
                },
            };
            self.stats.record(&report);
            return report;
        };

        let weight_line = scalecam_ui::weight_line(event.weight_g);
        self.display.show(&weight_line, "");
        debug!(
            weight_g = event.weight_g,
            delta_g = event.delta_g(),
            "weight changed"
        );

        let published = self.publisher.publish(event.weight_g);
        let capture = if self.run_cfg.require_publish && published.is_err() {
            None
        } else if let Some(request) = self.trigger.on_event(&event) {
            let outcome = self.pipeline.run(request);
            self.trigger.complete(&outcome);
            let note = if outcome.is_ok() {
                PhotoNote::Sent
            } else {
                PhotoNote::Failed
            };
            self.display.show(&weight_line, scalecam_ui::photo_line(note));
            Some(outcome)
        } else {
            None
        };

        let report = TickReport {
            auth,
            outcome: TickOutcome::Changed {
                weight_g: event.weight_g,
                published,
                capture,
            },
        };
        self.stats.record(&report);
        report
    }

    /// Read once and upload a photo now, bypassing filter and trigger.
    pub fn capture_now(&mut self) -> Result<UploadAck, ScaleError> {
        let sample = self.source.read();
        if !sample.is_valid() {
            return Err(ScaleError::SensorUnavailable(format!(
                "{} read failed",
                self.source.kind()
            )));
        }
        let ack = self.pipeline.run(CaptureRequest {
            weight_g: sample.grams,
        })?;
        Ok(ack)
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn filter_state(&self) -> WeightState {
        self.filter.state()
    }

    pub fn trigger(&self) -> &CaptureTrigger {
        &self.trigger
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
