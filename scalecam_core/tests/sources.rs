use std::rc::Rc;
use std::time::Duration;

use rstest::rstest;
use scalecam_core::{
    AnySource, ButtonCfg, ButtonSource, Calibration, LoadCellCfg, LoadCellSource,
    PotentiometerCfg, PotentiometerSource, READ_FAILED_G, ScaleError, WeightSource,
};
use scalecam_hardware::{SimulatedButton, SimulatedLoadCell, SimulatedPot};
use scalecam_traits::{AnalogInput, Clock, DigitalInput, LoadCellAdc, ManualClock};

fn clock() -> Rc<dyn Clock> {
    Rc::new(ManualClock::new())
}

fn pot(code: u16) -> PotentiometerSource<SimulatedPot> {
    PotentiometerSource::new(SimulatedPot::new(code, 0.0), PotentiometerCfg::default(), clock())
}

#[rstest]
#[case(0, 0.0)]
#[case(4095, 500.0)]
#[case(2048, 250.06)]
#[case(u16::MAX, 500.0)]
fn potentiometer_maps_and_clamps(#[case] code: u16, #[case] grams: f32) {
    let mut src = pot(code);
    let s = src.read();
    assert!(s.is_valid());
    assert!((s.grams - grams).abs() < 1e-3, "{code} -> {}", s.grams);
}

#[rstest]
fn potentiometer_read_failure_yields_sentinel() {
    let mut src = PotentiometerSource::new(SimulatedPot::failing(), PotentiometerCfg::default(), clock());
    let s = src.read();
    assert!(!s.is_valid());
    assert_eq!(s.grams, READ_FAILED_G);
}

#[rstest]
fn button_needs_the_press_to_hold_for_the_debounce_window() {
    let manual = ManualClock::new();
    let shared: Rc<dyn Clock> = Rc::new(manual.clone());
    let mut src = ButtonSource::new(SimulatedButton::presses(2, 2), ButtonCfg::default(), shared);
    let mut seen = Vec::new();
    for _ in 0..8 {
        seen.push(src.read().grams);
        manual.advance(Duration::from_millis(60));
    }
    // each press is confirmed on its second read
    assert_eq!(seen, vec![0.0, 10.0, 10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
}

#[rstest]
fn load_cell_tare_then_weigh() {
    // 100 counts per gram, 50 g already on the platform at tare time
    let cell = SimulatedLoadCell::new(80_000, 100.0).with_load(50.0);
    let mut src = LoadCellSource::new(
        cell,
        LoadCellCfg::default(),
        Calibration {
            scale_factor: 0.01,
            zero_counts: 0,
        },
        clock(),
    );
    let zero = src.tare().unwrap();
    assert_eq!(zero, 85_000);
    let s = src.read();
    assert!(s.is_valid());
    assert!(s.grams.abs() < 1e-3, "after tare: {}", s.grams);
}

#[rstest]
fn load_cell_clamps_negative_and_reports_not_ready() {
    let cell = SimulatedLoadCell::new(1_000, 10.0).not_ready_for(1);
    let mut src = LoadCellSource::new(
        cell,
        LoadCellCfg::default(),
        Calibration {
            scale_factor: 0.1,
            zero_counts: 2_000,
        },
        clock(),
    );
    let first = src.read();
    assert!(!first.is_valid());
    assert_eq!(first.grams, READ_FAILED_G);
    let second = src.read();
    assert!(second.is_valid());
    assert_eq!(second.grams, 0.0);
}

#[rstest]
fn tare_on_a_not_ready_cell_is_sensor_unavailable() {
    let cell = SimulatedLoadCell::new(0, 1.0).not_ready_for(1);
    let mut src = LoadCellSource::new(cell, LoadCellCfg::default(), Calibration::default(), clock());
    assert!(matches!(src.tare(), Err(ScaleError::SensorUnavailable(_))));
}

#[rstest]
fn any_source_dispatches_by_variant() {
    let adc: Box<dyn AnalogInput> = Box::new(SimulatedPot::new(4095, 0.0));
    let mut a = AnySource::Potentiometer(PotentiometerSource::new(adc, PotentiometerCfg::default(), clock()));
    assert_eq!(a.kind(), "potentiometer");
    assert_eq!(a.read().grams, 500.0);

    let input: Box<dyn DigitalInput> = Box::new(SimulatedButton::from_levels(Vec::<bool>::new()));
    let mut b = AnySource::Button(ButtonSource::new(input, ButtonCfg::default(), clock()));
    assert_eq!(b.kind(), "button");
    assert_eq!(b.read().grams, 0.0);

    let adc: Box<dyn LoadCellAdc> = Box::new(SimulatedLoadCell::new(0, 1.0).with_load(3.0));
    let mut c = AnySource::LoadCell(LoadCellSource::new(
        adc,
        LoadCellCfg::default(),
        Calibration::default(),
        clock(),
    ));
    assert_eq!(c.kind(), "load_cell");
    assert!((c.read().grams - 3.0).abs() < 1e-3);
}
