//! Display panel abstraction.
//!
//! The physical panel (an ST7789 behind SPI) is an external collaborator;
//! the rotation loop needs only "draw this frame" and "backlight on/off".
//! [`TerminalPanel`] is the desktop stand-in, printing each frame as one
//! line — the same role the original debug display mode plays.

use std::io::{self, Write};

/// One rendered readout: a value with its context and trend glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Short metric name ("Temperature").
    pub label: String,
    /// Formatted value, or an error marker.
    pub value_text: String,
    /// Unit suffix ("°C").
    pub unit: &'static str,
    /// Trend glyph; `None` while the metric's history is still filling.
    pub glyph: Option<&'static str>,
}

impl Frame {
    /// Frame shown when a metric's fetch failed this rotation step.
    pub fn error(label: &str) -> Self {
        Self {
            label: label.to_string(),
            value_text: "[ERROR]".into(),
            unit: "",
            glyph: None,
        }
    }
}

/// Where frames go.
pub trait DisplayPanel {
    /// Render one frame, replacing whatever was shown before.
    fn draw(&mut self, frame: &Frame);

    /// Light or blank the panel. Blanked on the way out.
    fn set_backlight(&mut self, on: bool);
}

/// Terminal stand-in for the hardware panel.
pub struct TerminalPanel {
    out: io::Stdout,
}

impl TerminalPanel {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for TerminalPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPanel for TerminalPanel {
    fn draw(&mut self, frame: &Frame) {
        let glyph = frame.glyph.unwrap_or(" ");
        // Terminal output is advisory; a closed stdout is not worth dying for.
        let _ = writeln!(
            self.out,
            "{}: {}{} {}",
            frame.label, frame.value_text, frame.unit, glyph
        );
    }

    fn set_backlight(&mut self, on: bool) {
        log::info!("backlight {}", if on { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_frame_has_marker_and_no_glyph() {
        let frame = Frame::error("Temperature");
        assert_eq!(frame.value_text, "[ERROR]");
        assert_eq!(frame.glyph, None);
        assert_eq!(frame.label, "Temperature");
    }
}
