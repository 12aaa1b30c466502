//! [`ParseState`]: the mutable state threaded through one parse run.

use crate::diagnostics::Diagnostic;
use crate::io::{InputSource, InputStack, OutputStack};
use crate::script_host::ScriptHost;

/// Macro-nesting depth, suspension depth, scratch buffers, deferred
/// input-stack mutations, and the script host, all in one place so a
/// `ScriptHost` callback can be handed a single `&mut ParseState` (via
/// [`crate::script_host::ParserHandle`]) without re-entering the parser's
/// main loop.
#[derive(Debug)]
pub struct ParseState {
    pub inputs: InputStack,
    pub outputs: OutputStack,
    /// Current macro nesting depth. Never observed negative from outside
    /// this module; see [`crate::error::MucglyError::InvalidMacroState`].
    in_macro: i64,
    /// Current suspension depth (`susp` tokens seen without a matching
    /// closing `end` yet).
    pub suspension: usize,
    /// Scratch buffer reused across lookahead probes, to avoid an
    /// allocation per candidate byte.
    pub preview_buf: Vec<u8>,
    /// Accumulates the body of the macro currently being read.
    pub macro_buf: Vec<u8>,
    /// Scratch buffer reused inside the match-probe routine.
    pub match_buf: Vec<u8>,
    /// Set when the dispatcher wrote through the host; informational only,
    /// mirrors the C original's `flush` flag.
    pub flush: bool,
    /// An input source queued by `:include`/`push_input`, to be pushed onto
    /// `inputs` only once the current macro's dispatch has fully returned.
    /// A second deferred push within the same macro replaces the first
    /// (see DESIGN.md's resolution of the corresponding open question).
    pub post_push: Option<InputSource>,
    /// Set by `close_input`/`:include`-adjacent bookkeeping; the current
    /// top input source is popped once dispatch returns.
    pub post_pop: bool,
    /// `warning`-severity diagnostics accumulated over the run. Unlike
    /// `error`/`fatal error`, a warning does not unwind the parser — see
    /// §7's Rust realization — so it is collected here instead of raised.
    /// No condition in this crate currently reports at `Warning` severity;
    /// the field exists so an embedder's own diagnostics (or a future error
    /// kind) have somewhere to land without widening `Parser::run`'s
    /// return type.
    warnings: Vec<Diagnostic>,
    /// Held as `Option` so a dispatch can temporarily move the host out
    /// (via [`ParseState::take_script`]) while it hands a [`ParserHandle`]
    /// borrowing the rest of `ParseState` to that very host — otherwise the
    /// borrow checker would see two overlapping mutable borrows of `self`.
    /// Always `Some` between dispatches; see [`ParseState::take_script`].
    script: Option<Box<dyn ScriptHost>>,
}

impl ParseState {
    pub fn new(script: Box<dyn ScriptHost>) -> Self {
        ParseState {
            inputs: InputStack::new(),
            outputs: OutputStack::new(),
            in_macro: 0,
            suspension: 0,
            preview_buf: Vec::new(),
            macro_buf: Vec::new(),
            match_buf: Vec::new(),
            flush: false,
            post_push: None,
            post_pop: false,
            warnings: Vec::new(),
            script: Some(script),
        }
    }

    /// Record a `warning`-severity diagnostic without aborting the run.
    pub fn push_warning(&mut self, diagnostic: Diagnostic) {
        self.warnings.push(diagnostic);
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// The location an error/diagnostic raised *right now* should be
    /// reported at: the macro-start position while a macro is open,
    /// otherwise the current read position, per §6's "the macro-start
    /// line/column is reported when an error occurs inside a macro;
    /// otherwise the current line/column."
    pub fn current_location(&self) -> Option<(String, usize, usize)> {
        self.inputs.top().map(|src| {
            let (line, col) = src.report_location();
            (src.name().to_string(), line, col)
        })
    }

    /// Move the script host out for the duration of one callback dispatch.
    /// Panics if called re-entrantly (the host is already checked out) —
    /// that would indicate the host tried to re-enter the parser's main
    /// loop, which the `ParserHandle` seam is designed to make impossible.
    pub fn take_script(&mut self) -> Box<dyn ScriptHost> {
        self.script.take().expect("script host checked out re-entrantly")
    }

    pub fn put_script(&mut self, host: Box<dyn ScriptHost>) {
        self.script = Some(host);
    }

    pub fn in_macro(&self) -> i64 {
        self.in_macro
    }

    pub fn enter_macro(&mut self) {
        self.in_macro += 1;
    }

    /// Decrement the macro depth. Returns `Err` if it would go negative —
    /// the one true internal-invariant violation this crate detects.
    pub fn exit_macro(&mut self) -> crate::error::Result<()> {
        self.in_macro -= 1;
        if self.in_macro < 0 {
            return Err(crate::error::MucglyError::InvalidMacroState);
        }
        Ok(())
    }

    /// Apply `post_push`/`post_pop` after a dispatch has fully returned, as
    /// required by §4.5 Step D.
    pub fn apply_deferred_input_changes(&mut self) {
        if let Some(src) = self.post_push.take() {
            self.inputs.push(src);
        }
        if self.post_pop {
            self.post_pop = false;
            self.inputs.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::hook::HookConfig;
    use crate::io::input::InputSource;
    use crate::script_host::{HostError, ParserHandle, ScriptHost};
    use std::path::Path;

    #[derive(Debug)]
    struct NoopHost;
    impl ScriptHost for NoopHost {
        fn eval(&mut self, _body: &[u8], _parser: &mut ParserHandle) -> std::result::Result<Vec<u8>, HostError> {
            Ok(Vec::new())
        }
        fn exec(&mut self, _body: &[u8], _parser: &mut ParserHandle) -> std::result::Result<(), HostError> {
            Ok(())
        }
        fn load(&mut self, _path: &Path, _parser: &mut ParserHandle) -> std::result::Result<(), HostError> {
            Ok(())
        }
    }

    #[test]
    fn current_location_tracks_the_top_source() {
        let mut state = ParseState::new(Box::new(NoopHost));
        assert_eq!(state.current_location(), None);
        state.inputs.push(InputSource::from_bytes("f", b"ab".to_vec(), HookConfig::default_template()));
        assert_eq!(state.current_location(), Some(("f".to_string(), 0, 0)));
    }

    #[test]
    fn warnings_accumulate_without_aborting() {
        let mut state = ParseState::new(Box::new(NoopHost));
        assert!(state.warnings().is_empty());
        state.push_warning(Diagnostic::new(Severity::Warning, None, "heads up"));
        assert_eq!(state.warnings().len(), 1);
        assert_eq!(state.warnings()[0].message, "heads up");
    }
}
