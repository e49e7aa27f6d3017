use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("hx711 not ready")]
    NotReady,
    #[error("timeout waiting for hx711 data ready")]
    DataReadyTimeout,
    #[error("camera unavailable: {0}")]
    Camera(String),
    #[error("analog read failed: {0}")]
    Analog(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
