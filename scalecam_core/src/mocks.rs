//! Test and helper doubles for scalecam_core

use std::cell::RefCell;
use std::rc::Rc;

use scalecam_traits::StatusDisplay;

/// Display that keeps every frame it was asked to show.
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    frames: Rc<RefCell<Vec<(String, String)>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the frames; stays valid after the display is moved.
    pub fn frames(&self) -> Rc<RefCell<Vec<(String, String)>>> {
        Rc::clone(&self.frames)
    }

    pub fn last_line1(&self) -> Option<String> {
        self.frames.borrow().last().map(|(l1, _)| l1.clone())
    }
}

impl StatusDisplay for RecordingDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        self.frames
            .borrow_mut()
            .push((line1.to_string(), line2.to_string()));
    }
}
