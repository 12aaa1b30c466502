//! The `ScriptHost` seam: the capability an embedder implements to evaluate
//! macro bodies as script source, injected as a closure-like trait object
//! rather than hard-wired to a concrete implementation.

use std::path::Path;

use crate::hook::HookSlot;
use crate::io::output::OutputSink;
use crate::io::input::InputSource;
use crate::parser::state::ParseState;

/// An error raised by the script host during `eval`/`exec`/`load`. Carries
/// only the host's own description of the failure; the parser wraps it in
/// [`crate::error::MucglyError::ScriptEval`] for reporting.
#[derive(Debug, Clone)]
pub struct HostError(pub String);

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for HostError {}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError(message.into())
    }
}

/// A borrowed, dispatch-scoped view into the parser state, handed to a
/// `ScriptHost` for the duration of exactly one `eval`/`exec`/`load` call.
/// The host cannot hold this past the call that gave it one, so it can
/// never re-enter the parser's main loop — only the callback surface below.
pub struct ParserHandle<'a> {
    state: &'a mut ParseState,
}

impl<'a> ParserHandle<'a> {
    pub fn new(state: &'a mut ParseState) -> Self {
        ParserHandle { state }
    }

    /// Append bytes to the top output sink.
    pub fn write(&mut self, bytes: &[u8]) -> crate::error::Result<()> {
        self.state.outputs.write(bytes)
    }

    /// Append bytes to the top output sink, followed by `\n`.
    pub fn puts(&mut self, bytes: &[u8]) -> crate::error::Result<()> {
        self.state.outputs.write(bytes)?;
        self.state.outputs.write(b"\n")
    }

    fn active_cfg(&self) -> Option<&crate::hook::HookConfig> {
        self.state.inputs.top().map(|s| s.cfg())
    }

    fn active_cfg_mut(&mut self) -> Option<&mut crate::hook::HookConfig> {
        self.state.inputs.top_mut().map(|s| s.cfg_mut())
    }

    pub fn hookbeg(&self) -> Option<Vec<u8>> {
        self.active_cfg().and_then(|c| c.hookbeg()).map(|s| s.to_vec())
    }

    pub fn hookend(&self) -> Option<Vec<u8>> {
        self.active_cfg().and_then(|c| c.hookend()).map(|s| s.to_vec())
    }

    pub fn hookesc(&self) -> Option<Vec<u8>> {
        self.active_cfg().map(|c| c.esc().to_vec())
    }

    pub fn set_hook(&mut self, beg: Vec<u8>, end: Vec<u8>) -> crate::error::Result<()> {
        match self.active_cfg_mut() {
            Some(cfg) => cfg.set_hook_pair(beg, end),
            None => Ok(()),
        }
    }

    pub fn set_hookbeg(&mut self, value: Vec<u8>) -> crate::error::Result<()> {
        match self.active_cfg_mut() {
            Some(cfg) => cfg.set_hook(HookSlot::Beg, value),
            None => Ok(()),
        }
    }

    pub fn set_hookend(&mut self, value: Vec<u8>) -> crate::error::Result<()> {
        match self.active_cfg_mut() {
            Some(cfg) => cfg.set_hook(HookSlot::End, value),
            None => Ok(()),
        }
    }

    pub fn set_hookesc(&mut self, value: Vec<u8>) -> crate::error::Result<()> {
        match self.active_cfg_mut() {
            Some(cfg) => cfg.set_hook(HookSlot::Esc, value),
            None => Ok(()),
        }
    }

    pub fn set_eater(&mut self, value: Option<Vec<u8>>) {
        if let Some(cfg) = self.active_cfg_mut() {
            cfg.set_eater(value);
        }
    }

    /// Add one or more multi-hook entries. Accepts the already-normalized
    /// triple shape; see [`HookTriple`] and [`normalize_flat_pairs`] for the
    /// flexible wire shapes a host binding may need to accept from its own
    /// scripting language before calling this.
    pub fn multihook(&mut self, triples: Vec<HookTriple>) -> crate::error::Result<()> {
        if let Some(cfg) = self.active_cfg_mut() {
            for t in triples {
                cfg.add_multi(t.beg, t.end, t.susp)?;
            }
        }
        Ok(())
    }

    /// Queue a new input source to become active once the current macro's
    /// dispatch returns (§4.5 Step D, §4.6 `:include`).
    pub fn push_input(&mut self, path: &Path) -> crate::error::Result<()> {
        let parent_cfg = self
            .state
            .inputs
            .top()
            .map(|s| s.cfg().clone())
            .unwrap_or_else(crate::hook::HookConfig::default_template);
        let src = InputSource::open_file(path, &parent_cfg)?;
        self.state.post_push = Some(src);
        Ok(())
    }

    /// Request that the current top input source be popped once dispatch
    /// returns.
    pub fn close_input(&mut self) {
        self.state.post_pop = true;
    }

    /// Push a new output sink immediately (output topology changes are not
    /// deferred — only input-stack mutations need that, per §9).
    pub fn push_output(&mut self, path: &Path) -> crate::error::Result<()> {
        self.state.outputs.push(OutputSink::create_file(path)?);
        Ok(())
    }

    pub fn close_output(&mut self) {
        self.state.outputs.pop();
    }

    pub fn block(&mut self) {
        if let Some(sink) = self.state.outputs.top_mut() {
            sink.block();
        }
    }

    pub fn unblock(&mut self) {
        if let Some(sink) = self.state.outputs.top_mut() {
            sink.unblock();
        }
    }

    pub fn ifilename(&self) -> Option<String> {
        self.state.inputs.top().map(|s| s.name().to_string())
    }

    /// 1-based, per §4.7: "all reported line/column numbers to the user are
    /// 1-based even though internal storage is 0-based."
    pub fn ilinenumber(&self) -> Option<usize> {
        self.state.inputs.top().map(|s| s.report_location().0 + 1)
    }

    pub fn ofilename(&self) -> Option<String> {
        self.state.outputs.top().map(|s| s.name().to_string())
    }

    pub fn olinenumber(&self) -> Option<usize> {
        self.state.outputs.top().map(|s| s.lineno() + 1)
    }
}

/// One normalized multi-hook entry; the host's own binding is responsible
/// for collapsing whatever shape its scripting language passed (a flat
/// even-length list, a list of 2/3-element sublists, ...) into these before
/// calling [`ParserHandle::multihook`], so `multihook` itself never has to
/// guess which shape it received. See DESIGN.md for why that normalization
/// duty sits in the host binding rather than here.
#[derive(Debug, Clone)]
pub struct HookTriple {
    pub beg: Vec<u8>,
    pub end: Vec<u8>,
    pub susp: Option<Vec<u8>>,
}

impl HookTriple {
    pub fn new(beg: impl Into<Vec<u8>>, end: impl Into<Vec<u8>>, susp: Option<Vec<u8>>) -> Self {
        HookTriple { beg: beg.into(), end: end.into(), susp }
    }
}

/// Collapse a flat even-length list of byte strings into 2-element
/// [`HookTriple`]s with no suspension marker. The common case from a
/// scripting binding that only passes `beg`/`end` pairs.
pub fn normalize_flat_pairs(flat: Vec<Vec<u8>>) -> Vec<HookTriple> {
    flat.chunks_exact(2)
        .map(|pair| HookTriple::new(pair[0].clone(), pair[1].clone(), None))
        .collect()
}

/// The capability an embedder implements to evaluate macro bodies as script
/// source. A trait object (`Box<dyn ScriptHost>`) rather than a generic
/// parameter, so `ParseState` can hold one without infecting every type in
/// the parser with a host type parameter. Requires `Debug` so that
/// `ParseState`, which owns one, can itself derive `Debug`.
pub trait ScriptHost: std::fmt::Debug {
    /// Evaluate `body` as a script expression (the `.` prefix); the
    /// returned bytes are the stringified result, which the dispatcher
    /// writes to the current output.
    fn eval(&mut self, body: &[u8], parser: &mut ParserHandle) -> Result<Vec<u8>, HostError>;

    /// Evaluate `body` as a script statement (the bare-prefix case),
    /// discarding any result.
    fn exec(&mut self, body: &[u8], parser: &mut ParserHandle) -> Result<(), HostError>;

    /// Load and evaluate a script file referenced by `:source`.
    fn load(&mut self, path: &Path, parser: &mut ParserHandle) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_flat_pairs_chunks_into_triples() {
        let flat = vec![b"<%".to_vec(), b"%>".to_vec(), b"{{".to_vec(), b"}}".to_vec()];
        let triples = normalize_flat_pairs(flat);
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].beg, b"<%");
        assert_eq!(triples[1].end, b"}}");
        assert!(triples[0].susp.is_none());
    }

    #[test]
    fn host_error_displays_its_message() {
        let e = HostError::new("boom");
        assert_eq!(e.to_string(), "boom");
    }
}
