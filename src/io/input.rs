//! [`InputSource`] and [`InputStack`]: the push-backable byte stream stack
//! that feeds the parser.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

use crate::error::{MucglyError, Result};
use crate::hook::HookPair;
use crate::HookConfig;

/// Anything the parser can pull bytes from: a real file, standard input, or
/// (in tests) an in-memory buffer. Boxed so `InputStack` can hold a
/// heterogeneous mix behind one interface. Requires `Debug` (satisfied by
/// `File`, `io::Stdin`, and `Cursor<Vec<u8>>` alike) so `InputSource` can
/// derive it in turn.
pub trait SourceHandle: Read + std::fmt::Debug {}
impl<T: Read + std::fmt::Debug + ?Sized> SourceHandle for T {}

/// One logical input: a name for diagnostics, the underlying handle, line
/// and column tracking, a push-back stack, the per-source hook
/// configuration, and the stack of currently-open hook pairs for nested
/// macros.
#[derive(Debug)]
pub struct InputSource {
    name: String,
    handle: Box<dyn SourceHandle>,
    is_stdin: bool,
    /// LIFO: the *last* byte is the next one `read_byte` returns.
    pushback: Vec<u8>,
    lineno: usize,
    column: usize,
    old_column: usize,
    macro_marker: Option<(usize, usize)>,
    eat_tail: bool,
    cfg: HookConfig,
    curhook: Vec<HookPair>,
}

impl InputSource {
    fn new(name: String, handle: Box<dyn SourceHandle>, is_stdin: bool, cfg: HookConfig) -> Self {
        InputSource {
            name,
            handle,
            is_stdin,
            pushback: Vec::new(),
            lineno: 0,
            column: 0,
            old_column: 0,
            macro_marker: None,
            eat_tail: false,
            cfg,
            curhook: Vec::new(),
        }
    }

    /// Open a file as a new source, inheriting `parent_cfg` (deep-copied)
    /// as its hook configuration.
    pub fn open_file(path: &Path, parent_cfg: &HookConfig) -> Result<Self> {
        let file = File::open(path).map_err(|source| MucglyError::SourceOpen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(InputSource::new(
            path.display().to_string(),
            Box::new(file),
            false,
            parent_cfg.clone(),
        ))
    }

    /// Wrap standard input as a new source.
    pub fn stdin(parent_cfg: &HookConfig) -> Self {
        InputSource::new("<stdin>".to_string(), Box::new(io::stdin()), true, parent_cfg.clone())
    }

    /// Wrap an in-memory buffer as a new source, for tests.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>, cfg: HookConfig) -> Self {
        InputSource::new(name.into(), Box::new(Cursor::new(bytes.into())), false, cfg)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stdin(&self) -> bool {
        self.is_stdin
    }

    pub fn cfg(&self) -> &HookConfig {
        &self.cfg
    }

    pub fn cfg_mut(&mut self) -> &mut HookConfig {
        &mut self.cfg
    }

    pub fn curhook(&self) -> &[HookPair] {
        &self.curhook
    }

    pub fn push_curhook(&mut self, pair: HookPair) {
        self.curhook.push(pair);
    }

    pub fn pop_curhook(&mut self) -> Option<HookPair> {
        self.curhook.pop()
    }

    pub fn top_curhook(&self) -> Option<&HookPair> {
        self.curhook.last()
    }

    pub fn set_eat_tail(&mut self) {
        self.eat_tail = true;
    }

    pub fn mark_macro_start(&mut self) {
        self.macro_marker = Some((self.lineno, self.column));
    }

    pub fn unmark_macro(&mut self) {
        self.macro_marker = None;
    }

    /// `(line, column)` to report on error: the macro-start location when a
    /// macro is open, otherwise the current position. Both 0-based.
    pub fn report_location(&self) -> (usize, usize) {
        self.macro_marker.unwrap_or((self.lineno, self.column))
    }

    fn advance_position(&mut self, byte: u8) {
        if byte == b'\n' {
            self.old_column = self.column;
            self.lineno += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
    }

    fn retreat_position(&mut self, byte: u8) {
        if byte == b'\n' {
            self.lineno -= 1;
            self.column = self.old_column;
            self.old_column = 0;
        } else {
            self.column -= 1;
        }
    }

    /// Read one byte, or `None` at end-of-source. See §4.1: pops the
    /// push-back stack first, updates line/column, then honors a pending
    /// one-shot `eat_tail` by discarding the byte just read and retrying.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        loop {
            let byte = match self.pushback.pop() {
                Some(b) => Some(b),
                None => {
                    let mut buf = [0u8; 1];
                    match self.handle.read(&mut buf)? {
                        0 => None,
                        _ => Some(buf[0]),
                    }
                }
            };
            let byte = match byte {
                Some(b) => b,
                None => return Ok(None),
            };
            self.advance_position(byte);
            if self.eat_tail {
                self.eat_tail = false;
                continue;
            }
            return Ok(Some(byte));
        }
    }

    /// Push back a byte the caller just read from this source.
    pub fn put_back(&mut self, byte: u8) {
        self.retreat_position(byte);
        self.pushback.push(byte);
    }

    /// Read up to `n` bytes from this source only (never crosses into a
    /// source further down the stack); the result may be shorter than `n`
    /// if end-of-source is hit first.
    pub fn read_n(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.read_byte()? {
                Some(b) => out.push(b),
                None => break,
            }
        }
        Ok(out)
    }

    /// Push a byte string back so that `bytes[0]` is the next byte read.
    pub fn put_back_n(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            self.put_back(b);
        }
    }
}

/// LIFO of [`InputSource`]s. The last element is the active (top) source.
#[derive(Debug, Default)]
pub struct InputStack {
    sources: Vec<InputSource>,
}

impl InputStack {
    pub fn new() -> Self {
        InputStack { sources: Vec::new() }
    }

    pub fn push(&mut self, source: InputSource) {
        self.sources.push(source);
    }

    pub fn pop(&mut self) -> Option<InputSource> {
        self.sources.pop()
    }

    pub fn top(&self) -> Option<&InputSource> {
        self.sources.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut InputSource> {
        self.sources.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.sources.len()
    }

    /// Read one byte from the top source. Does not pop on end-of-source —
    /// the caller may still legally push a byte back onto an exhausted
    /// source.
    pub fn get(&mut self) -> Result<Option<u8>> {
        match self.top_mut() {
            Some(src) => src.read_byte(),
            None => Ok(None),
        }
    }

    /// Read one byte, popping exhausted sources and retrying until a byte
    /// is produced or the stack empties.
    pub fn get_one(&mut self) -> Result<Option<u8>> {
        loop {
            if self.sources.is_empty() {
                return Ok(None);
            }
            match self.get()? {
                Some(b) => return Ok(Some(b)),
                None => {
                    self.pop();
                }
            }
        }
    }

    pub fn put_back(&mut self, byte: u8) {
        if let Some(src) = self.top_mut() {
            src.put_back(byte);
        }
    }

    /// Read up to `n` bytes from the top source only (§4.3's match probe).
    pub fn get_n(&mut self, n: usize) -> Result<Vec<u8>> {
        match self.top_mut() {
            Some(src) => src.read_n(n),
            None => Ok(Vec::new()),
        }
    }

    pub fn put_back_n(&mut self, bytes: &[u8]) {
        if let Some(src) = self.top_mut() {
            src.put_back_n(bytes);
        }
    }
}
