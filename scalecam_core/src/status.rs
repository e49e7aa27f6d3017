//! What a tick did, and running totals.

use crate::auth::AuthStatus;
use crate::error::{CaptureError, PublishError, ScaleError};
use crate::pipeline::UploadAck;

/// Result of `Device::setup`. Neither part is fatal: a camera that failed to
/// come up makes every capture fail, and auth is retried every tick.
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub camera_error: Option<ScaleError>,
    pub auth: AuthStatus,
}

impl SetupReport {
    pub fn camera_ready(&self) -> bool {
        self.camera_error.is_none()
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    /// The source failed to read; nothing else ran.
    SensorSkipped,
    /// Valid reading that the filter did not accept.
    NoChange { weight_g: f32 },
    /// Accepted change. `capture` is `None` when the trigger did not fire
    /// (or was skipped because the publish failed and `require_publish` is set).
    Changed {
        weight_g: f32,
        published: Result<(), PublishError>,
        capture: Option<Result<UploadAck, CaptureError>>,
    },
}

#[derive(Debug)]
pub struct TickReport {
    pub auth: AuthStatus,
    pub outcome: TickOutcome,
}

impl TickReport {
    pub fn changed_weight(&self) -> Option<f32> {
        match self.outcome {
            TickOutcome::Changed { weight_g, .. } => Some(weight_g),
            _ => None,
        }
    }

    pub fn captured(&self) -> bool {
        matches!(
            self.outcome,
            TickOutcome::Changed {
                capture: Some(Ok(_)),
                ..
            }
        )
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub changes: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub captures_ok: u64,
    pub captures_failed: u64,
    pub sensor_skips: u64,
    pub auth_timeouts: u64,
}

impl RunStats {
    pub fn record(&mut self, report: &TickReport) {
        self.ticks += 1;
        if let AuthStatus::TimedOut { .. } = report.auth {
            self.auth_timeouts += 1;
        }
        match &report.outcome {
            TickOutcome::SensorSkipped => self.sensor_skips += 1,
            TickOutcome::NoChange { .. } => {}
            TickOutcome::Changed {
                published, capture, ..
            } => {
                self.changes += 1;
                if published.is_ok() {
                    self.published += 1;
                } else {
                    self.publish_failures += 1;
                }
                match capture {
                    Some(Ok(_)) => self.captures_ok += 1,
                    Some(Err(_)) => self.captures_failed += 1,
                    None => {}
                }
            }
        }
    }
}
