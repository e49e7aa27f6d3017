//! Change filter: turns a stream of samples into weight-change events.

use std::time::Instant;

use tracing::trace;

use crate::config::FilterCfg;
use crate::sample::WeightSample;

/// A sample the filter accepted as a real change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightChangeEvent {
    pub weight_g: f32,
    pub previous_g: f32,
    pub at: Instant,
}

impl WeightChangeEvent {
    pub fn delta_g(&self) -> f32 {
        (self.weight_g - self.previous_g).abs()
    }
}

/// What the filter remembers between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightState {
    pub last_accepted_g: f32,
    /// `None` until the first change, so the first change is never debounced.
    pub last_change_at: Option<Instant>,
}

impl Default for WeightState {
    fn default() -> Self {
        Self {
            last_accepted_g: 0.0,
            last_change_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFilter {
    cfg: FilterCfg,
    state: WeightState,
}

impl ChangeFilter {
    pub fn new(cfg: FilterCfg) -> Self {
        Self {
            cfg,
            state: WeightState::default(),
        }
    }

    pub fn state(&self) -> WeightState {
        self.state
    }

    /// Accept `sample` if it moved at least `min_delta_g` from the last
    /// accepted weight and the debounce window has passed.
    ///
    /// Invalid samples and rejected samples leave the state untouched.
    pub fn accept(&mut self, sample: &WeightSample, now: Instant) -> Option<WeightChangeEvent> {
        if !sample.is_valid() {
            return None;
        }
        let previous = self.state.last_accepted_g;
        if (sample.grams - previous).abs() < self.cfg.min_delta_g {
            return None;
        }
        if let Some(last) = self.state.last_change_at
            && now.saturating_duration_since(last) < self.cfg.debounce
        {
            trace!(grams = sample.grams, "change debounced");
            return None;
        }
        self.state = WeightState {
            last_accepted_g: sample.grams,
            last_change_at: Some(now),
        };
        Some(WeightChangeEvent {
            weight_g: sample.grams,
            previous_g: previous,
            at: now,
        })
    }
}
