//! Terminal color utilities for diagnostic output.
//!
//! ANSI codes plus a `Painter` that degrades to plain text when not attached
//! to a TTY, or under `ColorMode::Never`.

use std::io::IsTerminal;

use crate::flags::ColorMode;

pub const RED: &str = "\x1b[31m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const RESET: &str = "\x1b[0m";

/// Determines if colors should be used based on `ColorMode` and terminal detection.
pub fn is_enabled(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stderr().is_terminal(),
    }
}

/// Colorizer passed around the diagnostic printer.
#[derive(Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            enabled: is_enabled(mode),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Error positions and messages - RED
    pub fn error(&self, s: &str) -> String {
        self.wrap(s, RED)
    }

    /// Warnings, suppressed-cascade notices - YELLOW
    pub fn warn(&self, s: &str) -> String {
        self.wrap(s, YELLOW)
    }

    /// Source positions (file:line) - CYAN
    pub fn pos(&self, s: &str) -> String {
        self.wrap(s, CYAN)
    }

    /// Headers - BOLD
    pub fn header(&self, s: &str) -> String {
        self.wrap(s, BOLD)
    }

    /// Secondary hints ("did you mean ...") - DIM
    pub fn dim(&self, s: &str) -> String {
        self.wrap(s, DIM)
    }

    pub fn wrap(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("{code}{s}{RESET}")
        } else {
            s.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn painter_disabled_is_plain() {
        let p = Painter { enabled: false };
        assert_eq!(p.error("test"), "test");
        assert_eq!(p.pos("test"), "test");
    }

    #[test]
    fn painter_enabled_wraps_codes() {
        let p = Painter { enabled: true };
        assert_eq!(p.error("test"), "\x1b[31mtest\x1b[0m");
        assert_eq!(p.pos("test"), "\x1b[36mtest\x1b[0m");
    }

    #[test]
    fn color_mode_detection() {
        assert!(is_enabled(ColorMode::Always));
        assert!(!is_enabled(ColorMode::Never));
    }
}
