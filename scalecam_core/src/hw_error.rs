//! Maps `Box<dyn Error>` from trait boundaries to typed `ScaleError`.
//!
//! Driver traits in `scalecam_traits` return boxed errors; this converts them
//! to our enum, downcasting `scalecam_hardware::HwError` when that feature is on.

use crate::error::ScaleError;

/// Map a trait-boundary error to a typed `ScaleError`.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ScaleError {
    #[cfg(feature = "hardware-errors")]
    {
        use scalecam_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::NotReady | HwError::DataReadyTimeout | HwError::Camera(_) => {
                    ScaleError::SensorUnavailable(hw.to_string())
                }
                other => ScaleError::Hardware(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("not ready") || lower.contains("timeout") {
        ScaleError::SensorUnavailable(s)
    } else {
        ScaleError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_errors_fall_back_to_text() {
        let e = std::io::Error::other("wait timeout on DT");
        assert!(matches!(map_hw_error(&e), ScaleError::SensorUnavailable(_)));
        let e = std::io::Error::other("bus fault");
        assert!(matches!(map_hw_error(&e), ScaleError::Hardware(_)));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_errors_are_downcast() {
        use scalecam_hardware::error::HwError;
        let boxed: scalecam_traits::BoxError = Box::new(HwError::NotReady);
        assert!(matches!(
            map_hw_error(boxed.as_ref()),
            ScaleError::SensorUnavailable(_)
        ));
        let boxed: scalecam_traits::BoxError = Box::new(HwError::Analog("x".into()));
        assert!(matches!(map_hw_error(boxed.as_ref()), ScaleError::Hardware(_)));
    }
}
