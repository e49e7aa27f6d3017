#![no_main]
use libfuzzer_sys::fuzz_target;
use scalecam_config::{CalibrationRow, LoadCellCalibration};

fuzz_target!(|rows: Vec<(i32, f32)>| {
    let rows: Vec<CalibrationRow> = rows
        .into_iter()
        .map(|(raw, grams)| CalibrationRow {
            raw: i64::from(raw),
            grams,
        })
        .collect();
    if let Ok(c) = LoadCellCalibration::from_rows(&rows) {
        assert!(c.scale_factor.is_finite() && c.scale_factor != 0.0);
    }
});
