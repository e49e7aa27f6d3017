use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `ready` until it returns true or `timeout` expires, sleeping
/// `poll_interval` between checks.
pub fn wait_until_ready(
    mut ready: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !ready() {
        if Instant::now() >= deadline {
            return Err(HwError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}
