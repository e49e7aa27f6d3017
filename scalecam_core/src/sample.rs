//! One reading from a weight source.

use std::time::Instant;

/// Grams value carried by a failed read.
pub const READ_FAILED_G: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    pub grams: f32,
    pub at: Instant,
    valid: bool,
}

impl WeightSample {
    /// A reading; non-finite values are treated as a failed read.
    pub fn new(grams: f32, at: Instant) -> Self {
        if grams.is_finite() {
            Self {
                grams,
                at,
                valid: true,
            }
        } else {
            Self::failed(at)
        }
    }

    pub fn failed(at: Instant) -> Self {
        Self {
            grams: READ_FAILED_G,
            at,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}
