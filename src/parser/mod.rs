//! The central state machine: [`state::ParseState`] plus the [`Parser`]
//! that drives it byte by byte, per §4.5 of the design.

pub mod state;
pub mod engine_loop;

pub use engine_loop::Parser;
pub use state::ParseState;
