//! Collaborator seams for the scale firmware.
//!
//! Everything the control loop talks to that is not core logic (ADC, GPIO,
//! load-cell amplifier, camera, HTTP, realtime database, auth session,
//! display) sits behind one of these traits so the core can run against real
//! drivers or the simulated ones in `scalecam_hardware`.
pub mod camera;
pub mod clock;
pub mod remote;

pub use camera::{Camera, CameraSettings, FrameSize};
pub use clock::{Clock, ManualClock, SystemClock};
pub use remote::{AuthSession, HttpResponse, HttpTransport, RealtimeDb, RemoteError};

/// Error type returned across driver boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 12-bit style analog input (potentiometer wiper).
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16, BoxError>;
}

/// Single digital input level (push button).
pub trait DigitalInput {
    fn is_high(&mut self) -> Result<bool, BoxError>;
}

/// Bridge amplifier such as the HX711.
pub trait LoadCellAdc {
    /// Data-ready check; must not block.
    fn is_ready(&mut self) -> bool;
    /// One signed conversion result in raw counts. May wait for the next
    /// conversion, bounded by the driver's own timeout.
    fn read_raw(&mut self) -> Result<i32, BoxError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        (**self).read_raw()
    }
}

impl<T: DigitalInput + ?Sized> DigitalInput for Box<T> {
    fn is_high(&mut self) -> Result<bool, BoxError> {
        (**self).is_high()
    }
}

impl<T: LoadCellAdc + ?Sized> LoadCellAdc for Box<T> {
    fn is_ready(&mut self) -> bool {
        (**self).is_ready()
    }

    fn read_raw(&mut self) -> Result<i32, BoxError> {
        (**self).read_raw()
    }
}

/// Two-line character display. Write-only.
pub trait StatusDisplay {
    fn show(&mut self, line1: &str, line2: &str);
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for Box<T> {
    fn show(&mut self, line1: &str, line2: &str) {
        (**self).show(line1, line2);
    }
}
