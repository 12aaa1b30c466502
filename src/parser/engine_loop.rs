//! The main parse loop (§4.5): reads one byte at a time off the top of
//! `InputStack`, screens it through the active source's first-byte bitmap,
//! and either passes it straight through or runs it through the delimiter
//! probes in priority order (escape, suspension, hook-end, hook-begin).

use crate::dispatch::{DirectiveDispatcher, DispatchOutcome};
use crate::error::{MucglyError, Result};
use crate::hook::HookPair;
use crate::parser::state::ParseState;

/// Outcome of one delimiter-probe attempt or escape/hookend/hookbegin step.
enum StepOutcome {
    NoMatch,
    Matched,
    Terminate,
}

pub struct Parser;

impl Parser {
    /// Run `state` to completion: end-of-input outside any macro, or a
    /// dispatched `:exit`. Returns `Err` on a fatal condition (§7).
    pub fn run(state: &mut ParseState) -> Result<()> {
        loop {
            let c = match state.inputs.get_one()? {
                Some(b) => b,
                None => {
                    return if state.in_macro() > 0 { Err(MucglyError::EofInMacro) } else { Ok(()) };
                }
            };

            let bitmap_hit = state.inputs.top().map(|s| s.cfg().bitmap_has(c)).unwrap_or(false);
            if !bitmap_hit {
                step_f_byte(state, c)?;
                continue;
            }

            state.inputs.put_back(c);

            match try_escape(state)? {
                StepOutcome::Terminate => return Ok(()),
                StepOutcome::Matched => continue,
                StepOutcome::NoMatch => {}
            }

            if state.in_macro() > 0 {
                match try_suspension(state)? {
                    StepOutcome::Matched => continue,
                    StepOutcome::Terminate => return Ok(()),
                    StepOutcome::NoMatch => {}
                }
                match try_hookend(state)? {
                    StepOutcome::Matched => continue,
                    StepOutcome::Terminate => return Ok(()),
                    StepOutcome::NoMatch => {}
                }
            }

            match try_hookbegin(state)? {
                StepOutcome::Matched => continue,
                StepOutcome::Terminate => return Ok(()),
                StepOutcome::NoMatch => {}
            }

            // Step B.5 fallthrough: none of the probes consumed the byte we
            // pushed back at the top of Step B, so reading one byte returns
            // exactly `c`.
            let c2 = state
                .inputs
                .get_one()?
                .ok_or(MucglyError::InvalidMacroState)?;
            step_f_byte(state, c2)?;
        }
    }
}

/// Step F: route one concrete (non-end-of-source) byte to the macro body or
/// straight to the active output sink.
fn step_f_byte(state: &mut ParseState, byte: u8) -> Result<()> {
    if state.in_macro() > 0 {
        state.macro_buf.push(byte);
        Ok(())
    } else {
        state.outputs.write(&[byte])
    }
}

/// Step C: open a new macro — increment nesting depth, record the
/// macro-start location, and clear the scratch body buffer.
fn enter_macro_full(state: &mut ParseState) {
    state.enter_macro();
    if let Some(src) = state.inputs.top_mut() {
        src.mark_macro_start();
    }
    state.macro_buf.clear();
}

/// The §4.3 match probe: read up to `delim.len()` bytes from the top
/// source, consuming them on a match, restoring them verbatim otherwise.
/// An immediate end-of-source pops the exhausted top source and reports
/// no-match, per §4.3.
fn probe_delim(state: &mut ParseState, delim: &[u8]) -> Result<bool> {
    let read = state.inputs.get_n(delim.len())?;
    if read.is_empty() {
        state.inputs.pop();
        return Ok(false);
    }
    if read == delim {
        Ok(true)
    } else {
        state.inputs.put_back_n(&read);
        Ok(false)
    }
}

/// Step B.1: the escape probe, always attempted first.
fn try_escape(state: &mut ParseState) -> Result<StepOutcome> {
    let esc = match state.inputs.top() {
        Some(src) => src.cfg().esc().to_vec(),
        None => return Ok(StepOutcome::NoMatch),
    };
    if !probe_delim(state, &esc)? {
        return Ok(StepOutcome::NoMatch);
    }

    let c2 = match state.inputs.get_one()? {
        Some(b) => b,
        None => {
            return if state.in_macro() > 0 { Err(MucglyError::EofInMacro) } else { Ok(StepOutcome::Terminate) };
        }
    };

    if state.in_macro() > 0 {
        try_escape_in_macro(state, c2)
    } else {
        try_escape_outside_macro(state, c2)
    }
}

fn try_escape_in_macro(state: &mut ParseState, c2: u8) -> Result<StepOutcome> {
    let esc_eq_end = state.inputs.top().map(|s| s.cfg().esc_eq_end()).unwrap_or(false);
    if (c2 == b' ' || c2 == b'\n') && esc_eq_end {
        return run_hookend_sequence(state, None);
    }

    if let Some(eater) = state.inputs.top().and_then(|s| s.cfg().eater()).map(|e| e.to_vec()) {
        if !eater.is_empty() && c2 == eater[0] {
            state.inputs.put_back(c2);
            if probe_delim(state, &eater)? {
                return Ok(StepOutcome::Matched);
            }
            let c2 = state.inputs.get_one()?.ok_or(MucglyError::EofInMacro)?;
            state.macro_buf.push(c2);
            return Ok(StepOutcome::Matched);
        }
    }

    state.macro_buf.push(c2);
    Ok(StepOutcome::Matched)
}

fn try_escape_outside_macro(state: &mut ParseState, c2: u8) -> Result<StepOutcome> {
    if let Some(eater) = state.inputs.top().and_then(|s| s.cfg().eater()).map(|e| e.to_vec()) {
        if !eater.is_empty() && c2 == eater[0] {
            state.inputs.put_back(c2);
            if probe_delim(state, &eater)? {
                return Ok(StepOutcome::Matched);
            }
            let c2 = state.inputs.get_one()?.ok_or(MucglyError::InvalidMacroState)?;
            state.outputs.write(&[c2])?;
            return Ok(StepOutcome::Matched);
        }
    }

    if c2 == b'\n' || c2 == b' ' {
        return Ok(StepOutcome::Matched);
    }

    let esc_eq_beg = state.inputs.top().map(|s| s.cfg().esc_eq_beg()).unwrap_or(false);
    if esc_eq_beg {
        let (esc_len, esc_first) = state
            .inputs
            .top()
            .map(|s| (s.cfg().esc().len(), s.cfg().esc().first().copied()))
            .unwrap_or((0, None));
        if esc_len == 1 && Some(c2) == esc_first {
            state.outputs.write(&[c2])?;
            return Ok(StepOutcome::Matched);
        }
        state.inputs.put_back(c2);
        let pair = state.inputs.top().and_then(|s| s.cfg().single_pair().cloned());
        if let Some(pair) = pair {
            if let Some(src) = state.inputs.top_mut() {
                src.push_curhook(pair);
            }
        }
        enter_macro_full(state);
        return Ok(StepOutcome::Matched);
    }

    state.outputs.write(&[c2])?;
    Ok(StepOutcome::Matched)
}

/// Step B.2: suspension probe, only attempted while inside a macro whose
/// currently-open hook pair has a suspension marker.
fn try_suspension(state: &mut ParseState) -> Result<StepOutcome> {
    let susp = match state.inputs.top().and_then(|s| s.top_curhook()).and_then(|p| p.susp.clone()) {
        Some(s) => s,
        None => return Ok(StepOutcome::NoMatch),
    };
    if probe_delim(state, &susp)? {
        state.suspension += 1;
        state.macro_buf.extend_from_slice(&susp);
        Ok(StepOutcome::Matched)
    } else {
        Ok(StepOutcome::NoMatch)
    }
}

/// Step B.3: hook-end probe against the currently-open hook pair.
fn try_hookend(state: &mut ParseState) -> Result<StepOutcome> {
    let end = match state.inputs.top().and_then(|s| s.top_curhook()).map(|p| p.end.clone()) {
        Some(e) => e,
        None => return Ok(StepOutcome::NoMatch),
    };
    if !probe_delim(state, &end)? {
        return Ok(StepOutcome::NoMatch);
    }
    if state.suspension > 0 {
        state.suspension -= 1;
        state.macro_buf.extend_from_slice(&end);
        return Ok(StepOutcome::Matched);
    }
    run_hookend_sequence(state, Some(&end))
}

/// Step D: close out a hook-end match (whether a literal delimiter match or
/// an escape-triggered whitespace close). `matched_end` carries the literal
/// delimiter bytes to re-emit when this closes a nested level; `None` for
/// the escape-triggered path, which has no delimiter bytes of its own to
/// replay (a documented simplification — see DESIGN.md).
fn run_hookend_sequence(state: &mut ParseState, matched_end: Option<&[u8]>) -> Result<StepOutcome> {
    state.exit_macro()?;

    if state.in_macro() > 0 {
        if let Some(end) = matched_end {
            state.outputs.write(end)?;
        }
        if let Some(src) = state.inputs.top_mut() {
            src.pop_curhook();
        }
        return Ok(StepOutcome::Matched);
    }

    let body = std::mem::take(&mut state.macro_buf);
    let skip = if body.first() == Some(&b'+') {
        if let Some(src) = state.inputs.top_mut() {
            src.set_eat_tail();
        }
        1
    } else {
        0
    };

    if let Some(src) = state.inputs.top_mut() {
        src.unmark_macro();
        src.pop_curhook();
    }

    let outcome = DirectiveDispatcher::dispatch(state, &body[skip..])?;
    state.apply_deferred_input_changes();

    match outcome {
        DispatchOutcome::Terminate => Ok(StepOutcome::Terminate),
        DispatchOutcome::Continue => Ok(StepOutcome::Matched),
    }
}

/// Step B.4: hook-begin probe, tried against every candidate delimiter in
/// priority order (the single pair, or the multi-hook vector in insertion
/// order).
fn try_hookbegin(state: &mut ParseState) -> Result<StepOutcome> {
    let candidates: Vec<HookPair> = match state.inputs.top() {
        Some(src) => src.cfg().beg_candidates().into_iter().cloned().collect(),
        None => return Ok(StepOutcome::NoMatch),
    };

    for pair in candidates {
        if probe_delim(state, &pair.beg)? {
            let beg = pair.beg.clone();
            if let Some(src) = state.inputs.top_mut() {
                src.push_curhook(pair);
            }
            if state.in_macro() > 0 {
                state.enter_macro();
                state.outputs.write(&beg)?;
            } else {
                enter_macro_full(state);
            }
            return Ok(StepOutcome::Matched);
        }
    }
    Ok(StepOutcome::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::HookConfig;
    use crate::io::input::InputSource;
    use crate::io::output::OutputSink;
    use crate::script_host::{HostError, ParserHandle, ScriptHost};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// A `ScriptHost` stub that treats every `.`/bare body as a fixed
    /// arithmetic table, just enough to drive the concrete scenarios.
    #[derive(Debug)]
    struct StubHost;
    impl ScriptHost for StubHost {
        fn eval(&mut self, body: &[u8], _parser: &mut ParserHandle) -> std::result::Result<Vec<u8>, HostError> {
            let trimmed = body
                .iter()
                .position(|&b| b != b' ' && b != b'\t')
                .map(|start| &body[start..])
                .unwrap_or(&[]);
            match trimmed {
                b"1+2" => Ok(b"3".to_vec()),
                b"42" => Ok(b"42".to_vec()),
                b"\"x\"" => Ok(b"x".to_vec()),
                other => Err(HostError::new(format!("unhandled expr {:?}", other))),
            }
        }
        fn exec(&mut self, _body: &[u8], _parser: &mut ParserHandle) -> std::result::Result<(), HostError> {
            Ok(())
        }
        fn load(&mut self, _path: &Path, _parser: &mut ParserHandle) -> std::result::Result<(), HostError> {
            Ok(())
        }
    }

    fn run_text(input: &str) -> String {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let mut state = ParseState::new(Box::new(StubHost));
        state.inputs.push(InputSource::from_bytes("t", input.as_bytes().to_vec(), HookConfig::default_template()));
        state.outputs.push(OutputSink::from_shared_buffer("t", buf.clone()));
        Parser::run(&mut state).unwrap();
        String::from_utf8(buf.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn scenario_1_script_expression() {
        assert_eq!(run_text("Hello -<.1+2>- world\n"), "Hello 3 world\n");
    }

    #[test]
    fn scenario_2_escape_passes_delimiters_literally() {
        assert_eq!(run_text("A\\-<B\\>-C"), "A-<B>-C");
    }

    #[test]
    fn scenario_4_block_unblock() {
        assert_eq!(run_text("-<:block>-HIDDEN-<:unblock>-SHOWN"), "SHOWN");
    }

    #[test]
    fn scenario_5_plus_prefix_eats_following_space() {
        assert_eq!(run_text("-<+. \"x\">- Y"), "xY");
    }

    #[test]
    fn scenario_6_deferred_evaluation_strips_one_hash() {
        assert_eq!(run_text("-<#still>-"), "-<still>-");
    }

    #[test]
    fn plain_text_passes_through_unchanged() {
        assert_eq!(run_text("no hooks here\n"), "no hooks here\n");
    }
}
