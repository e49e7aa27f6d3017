/// Linear raw-counts to grams model for the load cell.
///
/// grams = scale_factor * (raw - zero_counts)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub scale_factor: f32,
    pub zero_counts: i32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            zero_counts: 0,
        }
    }
}

impl Calibration {
    /// Grams for an averaged raw reading.
    pub fn grams(&self, avg_raw: f64) -> f32 {
        ((avg_raw - f64::from(self.zero_counts)) * f64::from(self.scale_factor)) as f32
    }
}
