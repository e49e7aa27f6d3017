//! Capture pipeline: flush stale frames, grab one, POST it, always release it.

use std::rc::Rc;

use scalecam_traits::{Camera, Clock, HttpTransport};
use tracing::{debug, info, warn};

use crate::config::PipelineCfg;
use crate::error::{CaptureError, ScaleError};
use crate::hw_error::map_hw_error;
use crate::trigger::CaptureRequest;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Server acknowledgement of an uploaded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    pub status_code: i32,
    pub body: String,
    pub bytes_sent: usize,
}

/// Hands the frame back to the driver when dropped, on every path out.
struct FrameGuard<'a, C: Camera> {
    camera: &'a mut C,
    frame: Option<C::Frame>,
}

impl<'a, C: Camera> FrameGuard<'a, C> {
    fn acquire(camera: &'a mut C) -> Option<Self> {
        let frame = camera.acquire()?;
        Some(Self {
            camera,
            frame: Some(frame),
        })
    }

    fn bytes(&self) -> &[u8] {
        match &self.frame {
            Some(f) => f.as_ref(),
            None => &[],
        }
    }
}

impl<C: Camera> Drop for FrameGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.camera.release(frame);
        }
    }
}

pub struct CapturePipeline<C, H> {
    camera: C,
    http: H,
    cfg: PipelineCfg,
    clock: Rc<dyn Clock>,
}

impl<C: Camera, H: HttpTransport> CapturePipeline<C, H> {
    pub fn new(camera: C, http: H, cfg: PipelineCfg, clock: Rc<dyn Clock>) -> Self {
        Self {
            camera,
            http,
            cfg,
            clock,
        }
    }

    /// Bring up the camera with the configured settings.
    pub fn init_camera(&mut self) -> Result<(), ScaleError> {
        self.camera.init(&self.cfg.camera).map_err(|e| {
            let err = map_hw_error(e.as_ref());
            warn!(error = %err, "camera init failed");
            err
        })?;
        info!(
            frame_size = ?self.cfg.camera.frame_size,
            jpeg_quality = self.cfg.camera.jpeg_quality,
            "camera ready"
        );
        Ok(())
    }

    /// Drop up to `flush_frames` buffered frames so the capture is fresh.
    fn flush(&mut self) {
        for n in 0..self.cfg.flush_frames {
            let Some(frame) = self.camera.acquire() else {
                debug!(flushed = n, "flush stopped early");
                return;
            };
            self.camera.release(frame);
            self.clock.sleep(self.cfg.flush_settle);
        }
    }

    /// Capture one frame and upload it. The frame buffer is released before
    /// the result is classified, whatever the outcome.
    pub fn run(&mut self, request: CaptureRequest) -> Result<UploadAck, CaptureError> {
        self.flush();

        let Some(guard) = FrameGuard::acquire(&mut self.camera) else {
            warn!(weight_g = request.weight_g, "camera capture failed");
            return Err(CaptureError::SensorUnavailable);
        };
        let len = guard.bytes().len();
        if len == 0 {
            warn!(weight_g = request.weight_g, "camera returned an empty frame");
            return Err(CaptureError::SensorUnavailable);
        }

        debug!(bytes = len, url = %self.cfg.endpoint_url, "uploading frame");
        let response = self
            .http
            .post(&self.cfg.endpoint_url, JPEG_CONTENT_TYPE, guard.bytes());
        drop(guard);

        if response.code > 0 {
            info!(
                code = response.code,
                bytes = len,
                weight_g = request.weight_g,
                "image uploaded"
            );
            Ok(UploadAck {
                status_code: response.code,
                body: response.body,
                bytes_sent: len,
            })
        } else {
            warn!(code = response.code, body = %response.body, "image upload failed");
            Err(CaptureError::TransportFailure {
                code: response.code,
            })
        }
    }
}
