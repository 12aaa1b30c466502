//! Error types for the preprocessor core.
//!
//! Every fallible operation in this crate returns [`Result`]. There is no
//! panicking path for the conditions enumerated here — they are ordinary
//! control flow, not programmer errors (the one true programmer error,
//! `in_macro` going negative, is itself reported as [`MucglyError::InvalidMacroState`]
//! rather than asserted away).

use std::io;
use thiserror::Error;

/// How a [`MucglyError`] should be reported and whether the run can continue.
///
/// Every variant here currently maps to a terminating severity (`Error` or
/// `Fatal`); `Warning` exists so that a future error kind, or an embedding
/// `ScriptHost`, can report a condition that lets the parser continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// The word used in the `mucgly <severity> ...` diagnostic line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal error",
        }
    }

    /// Process exit code an embedder should use when this is the terminal
    /// severity of a run. Zero is reserved for clean termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Severity::Warning => 0,
            Severity::Error => 1,
            Severity::Fatal => 2,
        }
    }
}

/// Errors produced by the preprocessor core.
#[derive(Debug, Error)]
pub enum MucglyError {
    #[error("cannot open input \"{path}\": {source}")]
    SourceOpen { path: String, #[source] source: io::Error },

    #[error("end-of-source within macro")]
    EofInMacro,

    #[error("unknown directive \":{name}\"")]
    UnknownDirective { name: String },

    #[error("hookesc equals a multi-hook beg/end delimiter")]
    MultiHookEscConflict,

    #[error("multi-hook table already holds the maximum of 127 entries")]
    MultiHookLimitExceeded,

    #[error("{0}")]
    ScriptEval(String),

    #[error("internal macro state (in_macro went negative)")]
    InvalidMacroState,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MucglyError {
    pub fn severity(&self) -> Severity {
        match self {
            MucglyError::SourceOpen { .. } => Severity::Fatal,
            MucglyError::EofInMacro => Severity::Fatal,
            MucglyError::UnknownDirective { .. } => Severity::Error,
            MucglyError::MultiHookEscConflict => Severity::Fatal,
            MucglyError::MultiHookLimitExceeded => Severity::Fatal,
            MucglyError::ScriptEval(_) => Severity::Error,
            MucglyError::InvalidMacroState => Severity::Fatal,
            MucglyError::Io(_) => Severity::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, MucglyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_match_spec_table() {
        assert_eq!(MucglyError::UnknownDirective { name: "xxx".into() }.severity(), Severity::Error);
        assert_eq!(MucglyError::EofInMacro.severity(), Severity::Fatal);
        assert_eq!(MucglyError::MultiHookLimitExceeded.severity(), Severity::Fatal);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Severity::Warning.exit_code(), 0);
        assert_eq!(Severity::Error.exit_code(), 1);
        assert_eq!(Severity::Fatal.exit_code(), 2);
    }
}
