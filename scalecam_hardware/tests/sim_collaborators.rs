use rstest::rstest;
use scalecam_hardware::{
    SimulatedAuth, SimulatedButton, SimulatedCamera, SimulatedDb, SimulatedHttp,
};
use scalecam_traits::{
    AuthSession, Camera, CameraSettings, DigitalInput, HttpTransport, RealtimeDb, RemoteError,
};

#[rstest]
fn camera_that_failed_init_yields_no_frames() {
    let mut cam = SimulatedCamera::new().failing_init();
    assert!(cam.init(&CameraSettings::default()).is_err());
    assert!(cam.acquire().is_none());
    assert_eq!(cam.counters().acquired.get(), 0);
}

#[rstest]
fn camera_counts_acquire_and_release() {
    let mut cam = SimulatedCamera::new();
    cam.init(&CameraSettings::default()).unwrap();
    let counters = cam.counters();
    let frame = cam.acquire().expect("frame");
    assert!(frame.as_ref().starts_with(&[0xFF, 0xD8]));
    assert_eq!(counters.outstanding(), 1);
    cam.release(frame);
    assert_eq!(counters.outstanding(), 0);
}

#[rstest]
#[case(200)]
#[case(500)]
#[case(-1)]
fn http_echoes_configured_code_and_records_posts(#[case] code: i32) {
    let mut http = SimulatedHttp::responding(code);
    let posts = http.posts();
    let resp = http.post("http://upload.test/api", "image/jpeg", &[1, 2, 3]);
    assert_eq!(resp.code, code);
    let posts = posts.borrow();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].content_type, "image/jpeg");
    assert_eq!(posts[0].len, 3);
}

#[rstest]
fn db_stores_values_until_told_to_fail() {
    let mut db = SimulatedDb::new();
    let values = db.values();
    db.set_f32("/scale/weight", 12.5).unwrap();
    assert_eq!(values.borrow().get("/scale/weight"), Some(&12.5));

    let mut broken = SimulatedDb::new().failing(RemoteError::new(-3, "permission denied"));
    let err = broken.set_f32("/scale/weight", 1.0).unwrap_err();
    assert_eq!(err.code, -3);
    assert_eq!(broken.writes().get(), 1);
}

#[rstest]
#[case(SimulatedAuth::ready(), true, 0)]
#[case(SimulatedAuth::after_steps(2), true, 2)]
#[case(SimulatedAuth::uninitialized(), false, 5)]
fn auth_readiness_follows_steps(
    #[case] mut auth: SimulatedAuth,
    #[case] initialized: bool,
    #[case] steps_to_ready: u32,
) {
    assert_eq!(auth.is_initialized(), initialized);
    for _ in 0..steps_to_ready {
        auth.step();
    }
    assert_eq!(auth.is_ready(), initialized);
}

#[rstest]
fn button_repeats_last_level_when_script_ends() {
    let mut b = SimulatedButton::from_levels([true, false, true]);
    let levels: Vec<bool> = (0..5).map(|_| b.is_high().unwrap()).collect();
    assert_eq!(levels, vec![true, false, true, true, true]);
}
