//! `From` implementations bridging `scalecam_config` types to `scalecam_core` types.

use std::time::Duration;

use scalecam_traits::{CameraSettings, FrameSize};

use crate::calibration::Calibration;
use crate::config::{
    AuthCfg, ButtonCfg, DeviceSettings, FilterCfg, LoadCellCfg, LoopCfg, PhotoThreshold,
    PipelineCfg, PotentiometerCfg, RemoteCfg, TriggerCfg,
};

// ── Sources ──────────────────────────────────────────────────────────────────

impl From<&scalecam_config::PotentiometerCfg> for PotentiometerCfg {
    fn from(c: &scalecam_config::PotentiometerCfg) -> Self {
        Self {
            adc_max: c.adc_max,
            min_weight_g: c.min_weight_g,
            max_weight_g: c.max_weight_g,
        }
    }
}

impl From<&scalecam_config::ButtonCfg> for ButtonCfg {
    fn from(c: &scalecam_config::ButtonCfg) -> Self {
        Self {
            increment_g: c.increment_g,
            debounce: Duration::from_millis(c.debounce_ms),
            release_adds: c.release_adds,
            max_weight_g: c.max_weight_g,
        }
    }
}

impl From<&scalecam_config::LoadCellCfg> for LoadCellCfg {
    fn from(c: &scalecam_config::LoadCellCfg) -> Self {
        Self {
            samples: c.samples,
            tare_samples: c.tare_samples,
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl From<&scalecam_config::LoadCellCalibration> for Calibration {
    fn from(c: &scalecam_config::LoadCellCalibration) -> Self {
        Self {
            scale_factor: c.scale_factor,
            zero_counts: c.zero_counts,
        }
    }
}

// ── Camera ───────────────────────────────────────────────────────────────────

// Both sides are foreign here, so these are plain functions rather than `From`.
fn frame_size(c: scalecam_config::FrameSizeCfg) -> FrameSize {
    use scalecam_config::FrameSizeCfg as F;
    match c {
        F::Qvga => FrameSize::Qvga,
        F::Vga => FrameSize::Vga,
        F::Svga => FrameSize::Svga,
        F::Sxga => FrameSize::Sxga,
        F::Uxga => FrameSize::Uxga,
    }
}

fn camera_settings(c: &scalecam_config::CameraCfg) -> CameraSettings {
    CameraSettings {
        frame_size: frame_size(c.frame_size),
        jpeg_quality: c.jpeg_quality,
        frame_buffers: c.frame_buffers,
    }
}

// ── Trigger ──────────────────────────────────────────────────────────────────

impl From<scalecam_config::PhotoThreshold> for PhotoThreshold {
    fn from(t: scalecam_config::PhotoThreshold) -> Self {
        match t {
            scalecam_config::PhotoThreshold::Grams(g) => PhotoThreshold::Grams(g),
            scalecam_config::PhotoThreshold::EveryChange => PhotoThreshold::EveryChange,
        }
    }
}

// ── DeviceSettings ───────────────────────────────────────────────────────────

/// Presets for `device.kind` are resolved here, with explicit keys winning.
impl From<&scalecam_config::Config> for DeviceSettings {
    fn from(c: &scalecam_config::Config) -> Self {
        let eff = c.effective();
        Self {
            filter: FilterCfg {
                min_delta_g: eff.min_delta_g,
                debounce: Duration::from_millis(eff.debounce_ms),
            },
            trigger: TriggerCfg {
                photo_threshold: eff.photo_threshold.into(),
            },
            pipeline: PipelineCfg {
                endpoint_url: c.capture.endpoint_url.trim().to_string(),
                flush_frames: c.capture.flush_frames,
                flush_settle: Duration::from_millis(c.capture.flush_settle_ms),
                camera: camera_settings(&c.camera),
            },
            auth: AuthCfg {
                deadline: Duration::from_millis(eff.auth_deadline_ms),
                poll_interval: Duration::from_millis(c.auth.poll_interval_ms),
            },
            remote: RemoteCfg {
                weight_path: c.remote.weight_path.clone(),
            },
            run: LoopCfg {
                tick: Duration::from_millis(c.device.tick_ms),
                require_publish: c.capture.require_publish,
            },
        }
    }
}
