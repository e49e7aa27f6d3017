pub mod error;
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "hardware")]
pub mod hx711;
pub mod sim;
pub mod util;

pub use sim::{
    CameraCounters, PostRecord, SimFrame, SimulatedAuth, SimulatedButton, SimulatedCamera,
    SimulatedDb, SimulatedHttp, SimulatedLoadCell, SimulatedPot,
};

#[cfg(feature = "http")]
pub use http::HttpClient;
#[cfg(feature = "hardware")]
pub use hardware::GpioButton;

#[cfg(feature = "hardware")]
mod hardware {
    use rppal::gpio::{Gpio, InputPin};
    use scalecam_traits::{BoxError, DigitalInput};

    use crate::error::{HwError, Result};

    /// Push button on a GPIO line with the internal pull-down enabled.
    pub struct GpioButton {
        pin: InputPin,
    }

    impl GpioButton {
        pub fn open(pin: u8) -> Result<Self> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let pin = gpio
                .get(pin)
                .map_err(|e| HwError::Gpio(format!("open button pin {pin}: {e}")))?
                .into_input_pulldown();
            Ok(Self { pin })
        }
    }

    impl DigitalInput for GpioButton {
        fn is_high(&mut self) -> std::result::Result<bool, BoxError> {
            Ok(self.pin.is_high())
        }
    }
}
