#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core scale logic (hardware-agnostic).
//!
//! All hardware and cloud interactions go through the traits in
//! `scalecam_traits`; this crate decides what to do with them.
//!
//! ## Architecture
//!
//! - **Sources**: potentiometer, debounced button or load cell, each producing
//!   a `WeightSample` (`source` module)
//! - **Filter**: minimum-delta plus debounce gate over samples (`filter`)
//! - **Trigger**: photo state machine keyed on distance from the last photo (`trigger`)
//! - **Pipeline**: flush, capture, POST, release (`pipeline`)
//! - **Remote**: weight publishing and the bounded auth wait (`publisher`, `auth`)
//! - **Device**: the single-threaded tick that ties them together (`device`, `runner`)
//!
//! One tick never overlaps another, and at most one frame buffer is held at a time.

pub mod auth;
pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod device;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod mocks;
pub mod pipeline;
pub mod publisher;
pub mod runner;
pub mod sample;
pub mod source;
pub mod status;
pub mod trigger;
pub mod util;

pub use auth::{AuthGate, AuthStatus};
pub use builder::{DeviceBuilder, Missing};
pub use calibration::Calibration;
pub use config::{
    AuthCfg, ButtonCfg, DeviceSettings, FilterCfg, LoadCellCfg, LoopCfg, PhotoThreshold,
    PipelineCfg, PotentiometerCfg, RemoteCfg, TriggerCfg,
};
pub use device::Device;
pub use error::{BuildError, CaptureError, PublishError, Result, ScaleError};
pub use filter::{ChangeFilter, WeightChangeEvent, WeightState};
pub use pipeline::{CapturePipeline, UploadAck};
pub use publisher::RemotePublisher;
pub use sample::{READ_FAILED_G, WeightSample};
pub use source::{AnySource, ButtonSource, LoadCellSource, PotentiometerSource, WeightSource};
pub use status::{RunStats, SetupReport, TickOutcome, TickReport};
pub use trigger::{CaptureRequest, CaptureTrigger, TriggerState};
