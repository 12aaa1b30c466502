//! Rendering of reported errors to the `mucgly <severity> ...` wire format
//! described in the external interfaces section of the design.
//!
//! This module only builds strings; it is up to the embedder (the `demos/`
//! driver, a test, a host application) to decide whether and where to print
//! them. The crate itself never writes to stderr on its own.

use crate::error::{MucglyError, Severity};

/// One reported condition, with the location it occurred at (if any input
/// source was active) and the severity to report it under.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// `(filename, 0-based line, 0-based column)`, when an input source was
    /// identified; `None` for conditions with no associated location.
    pub location: Option<(String, usize, usize)>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, location: Option<(String, usize, usize)>, message: impl Into<String>) -> Self {
        Diagnostic { severity, location, message: message.into() }
    }

    pub fn from_error(err: &MucglyError, location: Option<(String, usize, usize)>) -> Self {
        Diagnostic::new(err.severity(), location, err.to_string())
    }

    /// Render to `mucgly <severity> in "<filename>:<line+1>:<col+1>": <message>`
    /// or, with no location, `mucgly <severity>: <message>`.
    pub fn render(&self) -> String {
        match &self.location {
            Some((name, line, col)) => format!(
                "mucgly {} in \"{}:{}:{}\": {}",
                self.severity.as_str(),
                name,
                line + 1,
                col + 1,
                self.message
            ),
            None => format!("mucgly {}: {}", self.severity.as_str(), self.message),
        }
    }
}
