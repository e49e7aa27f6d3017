//! Small numeric helpers shared by the sources and the filter.

/// Quantize grams to integer centigrams, rounding to nearest and clamping to
/// the i32 range. Non-finite values map to 0.
#[inline]
pub fn grams_to_cg(g: f32) -> i32 {
    if !g.is_finite() {
        return 0;
    }
    let scaled = (g * 100.0).round();
    if scaled >= i32::MAX as f32 {
        i32::MAX
    } else if scaled <= i32::MIN as f32 {
        i32::MIN
    } else {
        scaled as i32
    }
}

/// Milliseconds in a duration, saturating at `u64::MAX`.
#[inline]
pub fn millis(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_centigram() {
        assert_eq!(grams_to_cg(0.006), 1);
        assert_eq!(grams_to_cg(-0.006), -1);
        assert_eq!(grams_to_cg(500.0), 50_000);
    }

    #[test]
    fn non_finite_and_huge_values() {
        assert_eq!(grams_to_cg(f32::NAN), 0);
        assert_eq!(grams_to_cg(f32::INFINITY), 0);
        assert_eq!(grams_to_cg(1.0e12), i32::MAX);
        assert_eq!(grams_to_cg(-1.0e12), i32::MIN);
    }
}
