//! Weight publishing to the realtime database.

use scalecam_traits::RealtimeDb;
use tracing::{debug, warn};

use crate::config::RemoteCfg;
use crate::error::PublishError;

/// Writes accepted weights to the realtime database.
pub struct RemotePublisher<D> {
    db: D,
    path: String,
}

impl<D: RealtimeDb> RemotePublisher<D> {
    pub fn new(db: D, cfg: &RemoteCfg) -> Self {
        Self {
            db,
            path: cfg.weight_path.clone(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn publish(&mut self, weight_g: f32) -> Result<(), PublishError> {
        match self.db.set_f32(&self.path, weight_g) {
            Ok(()) => {
                debug!(path = %self.path, weight_g, "weight published");
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path, code = e.code, message = %e.message, "weight publish failed");
                Err(PublishError {
                    code: e.code,
                    message: e.message,
                })
            }
        }
    }

    /// Give the client its per-tick slice for token refresh and keepalive.
    pub fn service(&mut self) {
        self.db.service();
    }
}
