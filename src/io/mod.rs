//! The I/O model: a stack of push-backable input sources feeding the
//! parser, and a stack of output sinks (one of which may be blocked).

pub mod input;
pub mod output;

pub use input::{InputSource, InputStack, SourceHandle};
pub use output::{OutputSink, OutputStack, SinkHandle};
