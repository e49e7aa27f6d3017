use crate::BoxError;

/// Sensor output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameSize {
    /// 320x240
    Qvga,
    /// 640x480
    Vga,
    /// 800x600
    #[default]
    Svga,
    /// 1280x1024
    Sxga,
    /// 1600x1200
    Uxga,
}

impl FrameSize {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            FrameSize::Qvga => (320, 240),
            FrameSize::Vga => (640, 480),
            FrameSize::Svga => (800, 600),
            FrameSize::Sxga => (1280, 1024),
            FrameSize::Uxga => (1600, 1200),
        }
    }
}

/// Settings handed to the camera driver at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraSettings {
    pub frame_size: FrameSize,
    /// JPEG quality, 0..=63; lower means higher quality.
    pub jpeg_quality: u8,
    /// Number of frame buffers the driver may fill ahead of us.
    pub frame_buffers: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::Svga,
            jpeg_quality: 12,
            frame_buffers: 1,
        }
    }
}

/// JPEG camera with driver-owned frame buffers.
///
/// Every frame returned by `acquire` must be handed back through `release`;
/// the driver cannot refill a buffer it still thinks is borrowed.
pub trait Camera {
    type Frame: AsRef<[u8]>;

    fn init(&mut self, settings: &CameraSettings) -> Result<(), BoxError>;
    /// Next buffered frame, or `None` when the sensor produced nothing.
    fn acquire(&mut self) -> Option<Self::Frame>;
    fn release(&mut self, frame: Self::Frame);
}
