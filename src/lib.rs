//! mucgly - a streaming text preprocessor
//!
//! Expands embedded script fragments inside arbitrary text, marked off by a
//! configurable pair of hook delimiters. See [`Engine`] for the top-level
//! entry point and [`ScriptHost`] for the seam an embedder implements to
//! provide the actual scripting language.

pub mod diagnostics;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod hook;
pub mod io;
pub mod parser;
pub mod script_host;

pub use dispatch::{DirectiveDispatcher, DispatchOutcome};
pub use diagnostics::Diagnostic;
pub use engine::{Engine, EngineOptions, ExitStatus, InputSpec, OutputSpec};
pub use error::{MucglyError, Result, Severity};
pub use hook::{HookConfig, HookPair, HookSlot};
pub use io::{InputSource, InputStack, OutputSink, OutputStack};
pub use parser::{ParseState, Parser};
pub use script_host::{HostError, HookTriple, ParserHandle, ScriptHost};
