//! [`OutputSink`] and [`OutputStack`]: the destination side of the byte
//! stream, with blockable nested sinks.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{MucglyError, Result};

/// Anything the parser can write bytes to: a real file, standard output, or
/// (in tests) an in-memory buffer. Requires `Debug` (satisfied by `File`,
/// `io::Stdout`, and the `SharedBuf` test handle alike) so `OutputSink` can
/// derive it in turn.
pub trait SinkHandle: Write + std::fmt::Debug {}
impl<T: Write + std::fmt::Debug + ?Sized> SinkHandle for T {}

/// One logical output: a name for diagnostics, the underlying handle, a
/// line counter, and a `blocked` flag that silently discards writes while
/// set (toggled by `:block`/`:unblock` and the matching `ScriptHost`
/// callbacks).
#[derive(Debug)]
pub struct OutputSink {
    name: String,
    handle: Box<dyn SinkHandle>,
    is_stdout: bool,
    lineno: usize,
    blocked: bool,
}

impl OutputSink {
    fn new(name: String, handle: Box<dyn SinkHandle>, is_stdout: bool) -> Self {
        OutputSink { name, handle, is_stdout, lineno: 0, blocked: false }
    }

    pub fn create_file(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| MucglyError::SourceOpen {
            path: path.display().to_string(),
            source,
        })?;
        Ok(OutputSink::new(path.display().to_string(), Box::new(file), false))
    }

    pub fn stdout() -> Self {
        OutputSink::new("<stdout>".to_string(), Box::new(io::stdout()), true)
    }

    /// Build a sink writing into a caller-owned `Vec<u8>` via a shared
    /// handle, for tests that want to inspect the bytes afterward.
    pub fn from_shared_buffer(name: impl Into<String>, buf: std::sync::Arc<std::sync::Mutex<Vec<u8>>>) -> Self {
        #[derive(Debug)]
        struct SharedBuf(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);
        impl Write for SharedBuf {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        OutputSink::new(name.into(), Box::new(SharedBuf(buf)), false)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stdout(&self) -> bool {
        self.is_stdout
    }

    pub fn lineno(&self) -> usize {
        self.lineno
    }

    pub fn blocked(&self) -> bool {
        self.blocked
    }

    pub fn block(&mut self) {
        self.blocked = true;
    }

    pub fn unblock(&mut self) {
        self.blocked = false;
    }

    pub fn toggle_blocked(&mut self) {
        self.blocked = !self.blocked;
    }

    /// Write bytes verbatim unless blocked, in which case they are silently
    /// dropped. Updates the line counter either way... no: a blocked sink
    /// never observed the bytes, so its line counter does not move.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.blocked {
            return Ok(());
        }
        self.handle.write_all(bytes)?;
        self.lineno += bytes.iter().filter(|&&b| b == b'\n').count();
        Ok(())
    }
}

/// LIFO of [`OutputSink`]s. Writes always go to the top sink.
#[derive(Debug, Default)]
pub struct OutputStack {
    sinks: Vec<OutputSink>,
}

impl OutputStack {
    pub fn new() -> Self {
        OutputStack { sinks: Vec::new() }
    }

    pub fn push(&mut self, sink: OutputSink) {
        self.sinks.push(sink);
    }

    pub fn pop(&mut self) -> Option<OutputSink> {
        self.sinks.pop()
    }

    pub fn top(&self) -> Option<&OutputSink> {
        self.sinks.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut OutputSink> {
        self.sinks.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.sinks.len()
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self.top_mut() {
            Some(sink) => sink.write_bytes(bytes),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn blocked_sink_drops_bytes() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = OutputSink::from_shared_buffer("t", buf.clone());
        sink.block();
        sink.write_bytes(b"HIDDEN").unwrap();
        sink.unblock();
        sink.write_bytes(b"SHOWN").unwrap();
        assert_eq!(&buf.lock().unwrap()[..], b"SHOWN");
    }

    #[test]
    fn nested_sink_isolation() {
        let bottom_buf = Arc::new(Mutex::new(Vec::new()));
        let top_buf = Arc::new(Mutex::new(Vec::new()));
        let mut stack = OutputStack::new();
        stack.push(OutputSink::from_shared_buffer("bottom", bottom_buf.clone()));
        stack.write(b"before").unwrap();
        stack.push(OutputSink::from_shared_buffer("top", top_buf.clone()));
        stack.write(b"diverted").unwrap();
        stack.pop();
        stack.write(b"after").unwrap();
        assert_eq!(&bottom_buf.lock().unwrap()[..], b"beforeafter");
        assert_eq!(&top_buf.lock().unwrap()[..], b"diverted");
    }

    #[test]
    fn lineno_counts_newlines_written() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut sink = OutputSink::from_shared_buffer("t", buf);
        sink.write_bytes(b"a\nb\nc").unwrap();
        assert_eq!(sink.lineno(), 2);
    }
}
