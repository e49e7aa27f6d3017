use std::time::Duration;

use rstest::rstest;
use scalecam_core::error::BuildError;
use scalecam_core::{
    Device, DeviceSettings, PhotoThreshold, PipelineCfg, PotentiometerCfg, PotentiometerSource,
};
use scalecam_hardware::{SimulatedAuth, SimulatedCamera, SimulatedDb, SimulatedHttp, SimulatedPot};
use scalecam_traits::{Clock, ManualClock};
use std::rc::Rc;

fn valid() -> DeviceSettings {
    DeviceSettings {
        pipeline: PipelineCfg {
            endpoint_url: "http://upload.test/x".into(),
            ..PipelineCfg::default()
        },
        ..DeviceSettings::default()
    }
}

fn build(settings: DeviceSettings) -> eyre::Result<()> {
    let clock: Rc<dyn Clock> = Rc::new(ManualClock::new());
    Device::builder()
        .with_source(PotentiometerSource::new(
            SimulatedPot::new(0, 0.0),
            PotentiometerCfg::default(),
            Rc::clone(&clock),
        ))
        .with_camera(SimulatedCamera::new())
        .with_http(SimulatedHttp::responding(200))
        .with_db(SimulatedDb::new())
        .with_auth(SimulatedAuth::ready())
        .with_clock(clock)
        .with_settings(settings)
        .build()
        .map(|_| ())
}

#[rstest]
fn valid_settings_build() {
    build(valid()).expect("valid settings");
}

#[rstest]
#[case::empty_endpoint(|s: &mut DeviceSettings| s.pipeline.endpoint_url = "  ".into(), "endpoint_url")]
#[case::negative_delta(|s: &mut DeviceSettings| s.filter.min_delta_g = -0.1, "min_delta_g")]
#[case::zero_photo(|s: &mut DeviceSettings| s.trigger.photo_threshold = PhotoThreshold::Grams(0.0), "photo threshold")]
#[case::zero_tick(|s: &mut DeviceSettings| s.run.tick = Duration::ZERO, "tick")]
#[case::zero_poll(|s: &mut DeviceSettings| s.auth.poll_interval = Duration::ZERO, "poll interval")]
#[case::relative_path(|s: &mut DeviceSettings| s.remote.weight_path = "scale/weight".into(), "weight_path")]
fn invalid_settings_yield_typed_build_error(
    #[case] tweak: fn(&mut DeviceSettings),
    #[case] needle: &str,
) {
    let mut s = valid();
    tweak(&mut s);
    let err = build(s).expect_err("should reject");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "got {msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}
