//! Auth gate: bounded wait for the cloud session before each tick.

use std::rc::Rc;
use std::time::Duration;

use scalecam_traits::{AuthSession, Clock};
use tracing::{trace, warn};

use crate::config::AuthCfg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Ready,
    /// The session was never set up (no credentials); nothing to wait for.
    NotInitialized,
    TimedOut { waited_ms: u64 },
}

pub struct AuthGate<A> {
    session: A,
    poll_interval: Duration,
    clock: Rc<dyn Clock>,
}

impl<A: AuthSession> AuthGate<A> {
    pub fn new(session: A, cfg: &AuthCfg, clock: Rc<dyn Clock>) -> Self {
        Self {
            session,
            poll_interval: cfg.poll_interval,
            clock,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Step the session until it is ready or `deadline` has passed.
    /// Returns immediately when already ready or never initialized.
    pub fn ensure_ready(&mut self, deadline: Duration) -> AuthStatus {
        if self.session.is_ready() {
            return AuthStatus::Ready;
        }
        if !self.session.is_initialized() {
            return AuthStatus::NotInitialized;
        }
        let start = self.clock.now();
        let mut polls: u32 = 0;
        loop {
            if self.session.is_ready() {
                trace!(polls, "auth ready");
                return AuthStatus::Ready;
            }
            if self.clock.has_elapsed(start, deadline) {
                let waited_ms = self.clock.ms_since(start);
                warn!(waited_ms, polls, "auth session not ready, giving up");
                return AuthStatus::TimedOut { waited_ms };
            }
            self.session.step();
            polls = polls.saturating_add(1);
            self.clock.sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scalecam_hardware::SimulatedAuth;
    use scalecam_traits::ManualClock;

    fn gate(session: SimulatedAuth, clock: &ManualClock) -> AuthGate<SimulatedAuth> {
        AuthGate::new(
            session,
            &AuthCfg {
                deadline: Duration::from_secs(1),
                poll_interval: Duration::from_millis(10),
            },
            Rc::new(clock.clone()),
        )
    }

    #[test]
    fn ready_session_is_not_stepped() {
        let clock = ManualClock::new();
        let auth = SimulatedAuth::ready();
        let steps = auth.steps();
        let mut g = gate(auth, &clock);
        assert_eq!(g.ensure_ready(Duration::from_secs(1)), AuthStatus::Ready);
        assert_eq!(steps.get(), 0);
    }

    #[test]
    fn stuck_session_times_out_at_deadline() {
        let clock = ManualClock::new();
        let mut g = gate(SimulatedAuth::stuck(), &clock);
        let status = g.ensure_ready(Duration::from_millis(100));
        assert_eq!(status, AuthStatus::TimedOut { waited_ms: 100 });
        assert_eq!(clock.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn uninitialized_session_returns_at_once() {
        let clock = ManualClock::new();
        let auth = SimulatedAuth::uninitialized();
        let steps = auth.steps();
        let mut g = gate(auth, &clock);
        assert_eq!(g.ensure_ready(Duration::from_secs(1)), AuthStatus::NotInitialized);
        assert_eq!(steps.get(), 0);
    }
}
