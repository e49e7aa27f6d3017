//! Paced run loop around `Device::tick`.

use std::sync::atomic::{AtomicBool, Ordering};

use scalecam_traits::{AuthSession, Camera, HttpTransport, RealtimeDb};
use tracing::info;

use crate::device::Device;
use crate::source::WeightSource;
use crate::status::RunStats;
use crate::util::millis;

impl<S, C, H, D, A> Device<S, C, H, D, A>
where
    S: WeightSource,
    C: Camera,
    H: HttpTransport,
    D: RealtimeDb,
    A: AuthSession,
{
    /// Tick until `shutdown` is set or `max_ticks` have run.
    ///
    /// Each tick starts one period after the previous one started; a tick
    /// that overruns the period is followed immediately by the next.
    pub fn run(&mut self, shutdown: &AtomicBool, max_ticks: Option<u64>) -> RunStats {
        let period = self.run_cfg.tick;
        info!(
            source = self.source.kind(),
            tick_ms = millis(period),
            max_ticks,
            "run start"
        );
        let mut ran: u64 = 0;
        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!(ticks = ran, "shutdown requested");
                break;
            }
            if max_ticks.is_some_and(|max| ran >= max) {
                break;
            }
            let started = self.clock.now();
            self.tick();
            ran += 1;
            let spent = self.clock.now().saturating_duration_since(started);
            self.clock.sleep(period.saturating_sub(spent));
        }
        let stats = self.stats;
        info!(
            ticks = stats.ticks,
            changes = stats.changes,
            captures_ok = stats.captures_ok,
            captures_failed = stats.captures_failed,
            "run complete"
        );
        stats
    }
}
