#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Status text for the two-line display, plus host-side display sinks.

use std::io::Write;

use scalecam_traits::StatusDisplay;

/// Width of the character display the firmware was laid out for.
pub const LINE_WIDTH: usize = 16;

/// Setup and fault messages shown on the first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Connecting,
    CameraReady,
    CameraFailed,
    AuthTimeout,
    ReadError,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::Connecting => "Connecting...",
            Notice::CameraReady => "Camera ready",
            Notice::CameraFailed => "Camera failed",
            Notice::AuthTimeout => "Auth timeout",
            Notice::ReadError => "Error reading",
        }
    }
}

/// Outcome of the photo step, shown under the weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoNote {
    None,
    Sent,
    Failed,
}

/// "Weight: 12.3 g"
pub fn weight_line(grams: f32) -> String {
    format!("Weight: {grams:.1} g")
}

pub fn photo_line(note: PhotoNote) -> &'static str {
    match note {
        PhotoNote::None => "",
        PhotoNote::Sent => "Photo sent",
        PhotoNote::Failed => "Photo failed",
    }
}

/// Clip to the display width on a char boundary.
pub fn fit(line: &str) -> &str {
    match line.char_indices().nth(LINE_WIDTH) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

/// Writes each update as two lines to any `Write` sink (stderr on the host).
pub struct TextDisplay<W: Write> {
    out: W,
    last: Option<(String, String)>,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusDisplay for TextDisplay<W> {
    fn show(&mut self, line1: &str, line2: &str) {
        let l1 = fit(line1);
        let l2 = fit(line2);
        if self
            .last
            .as_ref()
            .is_some_and(|(a, b)| a == l1 && b == l2)
        {
            return;
        }
        // Display output is best-effort; a closed pipe must not stop the loop.
        if let Err(e) = writeln!(self.out, "| {l1:<w$} |\n| {l2:<w$} |", w = LINE_WIDTH) {
            tracing::debug!(error = %e, "display write failed");
        }
        self.last = Some((l1.to_string(), l2.to_string()));
    }
}

/// Display that only emits a trace event; used when no screen is attached.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl StatusDisplay for LogDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        tracing::debug!(line1, line2, "display");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, "Weight: 0.0 g")]
    #[case(6.0, "Weight: 6.0 g")]
    #[case(250.06, "Weight: 250.1 g")]
    #[case(1234.44, "Weight: 1234.4 g")]
    fn weight_line_has_one_decimal(#[case] g: f32, #[case] expected: &str) {
        assert_eq!(weight_line(g), expected);
    }

    #[test]
    fn fit_clips_to_width() {
        assert_eq!(fit("Weight: 1234.4 g extra"), "Weight: 1234.4 g");
        assert_eq!(fit("short"), "short");
    }

    #[test]
    fn text_display_skips_repeated_frames() {
        let mut d = TextDisplay::new(Vec::new());
        d.show(Notice::Connecting.text(), "");
        d.show(Notice::Connecting.text(), "");
        d.show(&weight_line(5.0), photo_line(PhotoNote::Sent));
        let out = String::from_utf8(d.into_inner()).unwrap();
        assert_eq!(out.matches("Connecting...").count(), 1);
        assert!(out.contains("Photo sent"));
    }
}
