//! Runtime configuration for the control loop.
//!
//! These are the structs the core works with; they are separate from the
//! TOML-deserialized config in `scalecam_config` (see `conversions`).

use std::time::Duration;

use scalecam_traits::CameraSettings;

/// Change filter thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCfg {
    /// Smallest weight movement (grams) reported as a change.
    pub min_delta_g: f32,
    /// Minimum time between two accepted changes; zero disables.
    pub debounce: Duration,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            min_delta_g: 0.5,
            debounce: Duration::ZERO,
        }
    }
}

/// How far the weight must move from the last photo before another is taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotoThreshold {
    Grams(f32),
    EveryChange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerCfg {
    pub photo_threshold: PhotoThreshold,
}

impl Default for TriggerCfg {
    fn default() -> Self {
        Self {
            photo_threshold: PhotoThreshold::Grams(5.0),
        }
    }
}

/// Capture pipeline settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineCfg {
    pub endpoint_url: String,
    /// Stale frames discarded before the real capture.
    pub flush_frames: u8,
    pub flush_settle: Duration,
    pub camera: CameraSettings,
}

impl Default for PipelineCfg {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            flush_frames: 3,
            flush_settle: Duration::from_millis(30),
            camera: CameraSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCfg {
    pub deadline: Duration,
    pub poll_interval: Duration,
}

impl Default for AuthCfg {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(120),
            poll_interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCfg {
    pub weight_path: String,
}

impl Default for RemoteCfg {
    fn default() -> Self {
        Self {
            weight_path: "/scale/weight".into(),
        }
    }
}

/// Loop pacing and ordering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopCfg {
    pub tick: Duration,
    /// Skip the photo trigger for a change whose publish failed.
    pub require_publish: bool,
}

impl Default for LoopCfg {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            require_publish: false,
        }
    }
}

/// Everything `DeviceBuilder` needs besides the collaborators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSettings {
    pub filter: FilterCfg,
    pub trigger: TriggerCfg,
    pub pipeline: PipelineCfg,
    pub auth: AuthCfg,
    pub remote: RemoteCfg,
    pub run: LoopCfg,
}

/// Potentiometer mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
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

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonCfg {
    pub increment_g: f32,
    pub debounce: Duration,
    pub release_adds: bool,
    pub max_weight_g: f32,
}

impl Default for ButtonCfg {
    fn default() -> Self {
        Self {
            increment_g: 10.0,
            debounce: Duration::from_millis(50),
            release_adds: false,
            max_weight_g: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadCellCfg {
    pub samples: u8,
    pub tare_samples: u8,
}

impl Default for LoadCellCfg {
    fn default() -> Self {
        Self {
            samples: 5,
            tare_samples: 10,
        }
    }
}
