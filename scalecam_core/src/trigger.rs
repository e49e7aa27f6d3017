//! Photo trigger: decides which weight changes are worth a picture.
//!
//! Idle --(event past threshold)--> Capturing --(pipeline result)--> Idle
//!
//! `last_photo_g` only moves when a capture succeeds, so a failed upload is
//! retried on the next qualifying change. It starts unset and takes the first
//! reading the device sees, so a load already on the platform at boot is
//! published but not photographed.

use tracing::debug;

use crate::config::{PhotoThreshold, TriggerCfg};
use crate::error::CaptureError;
use crate::filter::WeightChangeEvent;
use crate::pipeline::UploadAck;

/// Ask the pipeline for one photo at this weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub weight_g: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerState {
    Idle,
    Capturing { weight_g: f32 },
}

#[derive(Debug, Clone)]
pub struct CaptureTrigger {
    threshold: PhotoThreshold,
    last_photo_g: Option<f32>,
    state: TriggerState,
}

impl CaptureTrigger {
    pub fn new(cfg: TriggerCfg) -> Self {
        Self {
            threshold: cfg.photo_threshold,
            last_photo_g: None,
            state: TriggerState::Idle,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn last_photo_g(&self) -> Option<f32> {
        self.last_photo_g
    }

    /// Set the photo baseline if nothing has set it yet.
    pub fn seed(&mut self, weight_g: f32) {
        if self.last_photo_g.is_none() {
            debug!(weight_g, "photo baseline");
            self.last_photo_g = Some(weight_g);
        }
    }

    /// Offer a change. Returns a request, and enters `Capturing`, when the
    /// weight has moved far enough from the last photo. Ignored while a
    /// capture is already in flight. Without a baseline the event becomes one.
    pub fn on_event(&mut self, event: &WeightChangeEvent) -> Option<CaptureRequest> {
        if let TriggerState::Capturing { .. } = self.state {
            return None;
        }
        let fire = match (self.threshold, self.last_photo_g) {
            (PhotoThreshold::EveryChange, _) => true,
            (PhotoThreshold::Grams(g), Some(last)) => (event.weight_g - last).abs() >= g,
            (PhotoThreshold::Grams(_), None) => {
                self.seed(event.weight_g);
                false
            }
        };
        if !fire {
            return None;
        }
        debug!(
            weight_g = event.weight_g,
            last_photo_g = ?self.last_photo_g,
            "photo triggered"
        );
        self.state = TriggerState::Capturing {
            weight_g: event.weight_g,
        };
        Some(CaptureRequest {
            weight_g: event.weight_g,
        })
    }

    /// Feed back the pipeline result. Returns `true` when the photo weight
    /// advanced; `false` on failure or when no capture was in flight.
    pub fn complete(&mut self, outcome: &Result<UploadAck, CaptureError>) -> bool {
        let TriggerState::Capturing { weight_g } = self.state else {
            return false;
        };
        self.state = TriggerState::Idle;
        if outcome.is_ok() {
            self.last_photo_g = Some(weight_g);
            true
        } else {
            false
        }
    }
}
