//! Diagnostic bag and error-counter gating (§7).
//!
//! `FatalError` follows the manual `enum` + `impl Display + std::error::Error`
//! shape, one variant per failure domain. The position-prefixed,
//! per-line-capped diagnostic stream, and the `nerrors`/`nsavederrors` split
//! counter are §7 rendered directly into Rust types.

use std::fmt;
use std::path::PathBuf;

use crate::colors::Painter;

/// A source position. "command line" (no file/line) is used for import and
/// environment fatals per §4.3/§7.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Position {
    File { file: PathBuf, line: u32 },
    CommandLine,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::File { file, line } => write!(f, "{}:{}", file.display(), line),
            Position::CommandLine => write!(f, "command line"),
        }
    }
}

/// A single recorded type/semantic error (§7 "Type errors": local, recorded,
/// analysis continues).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub pos: Position,
    pub message: String,
}

/// Fatal failure domains (§7 "Import errors", "Environment errors").
/// These always abort the process immediately; they are never pushed into
/// the recoverable `Diagnostics` bag.
#[derive(Debug)]
pub enum FatalError {
    Import { path: String, reason: String },
    Environment(String),
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::Import { path, reason } => write!(f, "import {path}: {reason}"),
            FatalError::Environment(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FatalError {}

/// Batches diagnostics, enforces the per-line cap, and tracks the
/// `nerrors`/`nsavederrors` split counter described in §7.
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    /// Count of reported diagnostics per (file, line), for the 10-per-line cap.
    per_line: std::collections::HashMap<(PathBuf, u32), u32>,
    nerrors: u32,
    nsavederrors: u32,
    unlimited: bool,
    halt_on_first: bool,
}

const ERRORS_PER_LINE_CAP: u32 = 10;

impl Diagnostics {
    pub fn new(unlimited: bool, halt_on_first: bool) -> Self {
        Self {
            records: Vec::new(),
            per_line: std::collections::HashMap::new(),
            nerrors: 0,
            nsavederrors: 0,
            unlimited,
            halt_on_first,
        }
    }

    /// Record a type error at `pos`. Returns `Err` only when `-h` is set and
    /// this is the first error (§4.5: "except when `-h` is set, in which
    /// case the first error halts").
    pub fn error(&mut self, pos: Position, message: impl Into<String>) -> Result<(), HaltRequested> {
        let message = message.into();
        let suppressed = match &pos {
            Position::File { file, line } => {
                let count = self.per_line.entry((file.clone(), *line)).or_insert(0);
                *count += 1;
                !self.unlimited && *count > ERRORS_PER_LINE_CAP
            }
            Position::CommandLine => false,
        };

        self.nerrors += 1;
        if !suppressed {
            self.records.push(Diagnostic { pos, message });
        }

        if self.halt_on_first && self.nerrors == 1 {
            return Err(HaltRequested);
        }
        Ok(())
    }

    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn nerrors(&self) -> u32 {
        self.nerrors
    }

    /// Sum of current-phase and carried-forward errors (§7 propagation
    /// policy); the driver checks this at each phase gate.
    pub fn total(&self) -> u32 {
        self.nerrors + self.nsavederrors
    }

    /// Transfer `nerrors` into `nsavederrors` and reset `nerrors`, so a
    /// recoverable phase can still finish its remaining work (§7
    /// `saveerrors()`).
    pub fn save_errors(&mut self) {
        self.nsavederrors += self.nerrors;
        self.nerrors = 0;
    }

    pub fn print(&self, painter: &Painter) {
        for d in &self.records {
            eprintln!("{}: {}", painter.pos(&d.pos.to_string()), painter.error(&d.message));
        }
    }
}

/// Signals that `-h` (halt on first error) has fired.
#[derive(Debug)]
pub struct HaltRequested;

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: u32) -> Position {
        Position::File {
            file: PathBuf::from("x.go"),
            line,
        }
    }

    #[test]
    fn caps_errors_per_line_by_default() {
        let mut diags = Diagnostics::new(false, false);
        for _ in 0..15 {
            diags.error(pos(1), "boom").unwrap();
        }
        assert_eq!(diags.nerrors(), 15);
        assert_eq!(diags.records().len(), ERRORS_PER_LINE_CAP as usize);
    }

    #[test]
    fn unlimited_flag_removes_the_cap() {
        let mut diags = Diagnostics::new(true, false);
        for _ in 0..15 {
            diags.error(pos(1), "boom").unwrap();
        }
        assert_eq!(diags.records().len(), 15);
    }

    #[test]
    fn halt_on_first_error_returns_err_once() {
        let mut diags = Diagnostics::new(false, true);
        assert!(diags.error(pos(1), "first").is_err());
    }

    #[test]
    fn save_errors_transfers_and_resets_counter() {
        let mut diags = Diagnostics::new(false, false);
        diags.error(pos(1), "e").unwrap();
        assert_eq!(diags.total(), 1);
        diags.save_errors();
        assert_eq!(diags.nerrors(), 0);
        assert_eq!(diags.total(), 1);
    }

    #[test]
    fn command_line_position_displays_without_file() {
        assert_eq!(Position::CommandLine.to_string(), "command line");
    }
}
