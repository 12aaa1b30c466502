//! [`DirectiveDispatcher`]: interprets a finished macro body by its prefix
//! byte, per §4.6 — one of an internal directive, a script expression, a
//! comment, deferred evaluation, or a bare script statement.

use std::path::Path;

use crate::error::{MucglyError, Result};
use crate::hook::HookSlot;
use crate::parser::state::ParseState;
use crate::script_host::ParserHandle;

/// What the dispatcher asks the main loop to do once it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    Terminate,
}

pub struct DirectiveDispatcher;

impl DirectiveDispatcher {
    /// Run `body` (the macro body, after the one-shot `+`-eater prefix has
    /// already been stripped by the caller) to completion, writing any
    /// resulting text through `state.outputs`.
    pub fn dispatch(state: &mut ParseState, body: &[u8]) -> Result<DispatchOutcome> {
        match body.first() {
            None => Ok(DispatchOutcome::Continue),
            Some(b':') => Self::directive(state, &body[1..]),
            Some(b'.') => {
                let mut host = state.take_script();
                let result = {
                    let mut parser = ParserHandle::new(state);
                    host.eval(&body[1..], &mut parser)
                };
                state.put_script(host);
                match result {
                    Ok(bytes) => {
                        state.outputs.write(&bytes)?;
                        Ok(DispatchOutcome::Continue)
                    }
                    Err(e) => Err(MucglyError::ScriptEval(e.0)),
                }
            }
            Some(b'/') => Ok(DispatchOutcome::Continue),
            Some(b'#') => {
                let beg = state.inputs.top().and_then(|s| s.cfg().hookbeg()).map(|b| b.to_vec());
                let end = state.inputs.top().and_then(|s| s.cfg().hookend()).map(|b| b.to_vec());
                if let (Some(beg), Some(end)) = (beg, end) {
                    // Strip exactly one leading '#' from the remainder.
                    let remainder = &body[1..];
                    state.outputs.write(&beg)?;
                    state.outputs.write(remainder)?;
                    state.outputs.write(&end)?;
                }
                Ok(DispatchOutcome::Continue)
            }
            Some(_) => Self::script_statement(state, body),
        }
    }

    fn script_statement(state: &mut ParseState, body: &[u8]) -> Result<DispatchOutcome> {
        let mut host = state.take_script();
        let result = {
            let mut parser = ParserHandle::new(state);
            host.exec(body, &mut parser)
        };
        state.put_script(host);
        result.map_err(|e| MucglyError::ScriptEval(e.0))?;
        Ok(DispatchOutcome::Continue)
    }

    fn directive(state: &mut ParseState, rest: &[u8]) -> Result<DispatchOutcome> {
        let (name, arg) = split_directive(rest);
        match name {
            b"hookbeg" => {
                set_active_hook(state, HookSlot::Beg, arg.to_vec())?;
                Ok(DispatchOutcome::Continue)
            }
            b"hookend" => {
                set_active_hook(state, HookSlot::End, arg.to_vec())?;
                Ok(DispatchOutcome::Continue)
            }
            b"hookesc" => {
                set_active_hook(state, HookSlot::Esc, arg.to_vec())?;
                Ok(DispatchOutcome::Continue)
            }
            b"hookall" => {
                set_active_hook(state, HookSlot::Beg, arg.to_vec())?;
                set_active_hook(state, HookSlot::End, arg.to_vec())?;
                set_active_hook(state, HookSlot::Esc, arg.to_vec())?;
                Ok(DispatchOutcome::Continue)
            }
            b"hook" => {
                let mut parts = arg.splitn(2, |&b| b == b' ');
                let a = parts.next().unwrap_or(&[]).to_vec();
                let b = parts.next().map(|x| x.to_vec()).unwrap_or_else(|| a.clone());
                if let Some(src) = state.inputs.top_mut() {
                    src.cfg_mut().set_hook_pair(a, b)?;
                }
                Ok(DispatchOutcome::Continue)
            }
            b"eater" => {
                let value = if arg.is_empty() { None } else { Some(arg.to_vec()) };
                if let Some(src) = state.inputs.top_mut() {
                    src.cfg_mut().set_eater(value);
                }
                Ok(DispatchOutcome::Continue)
            }
            b"include" => {
                let path = Path::new(std::str::from_utf8(arg).unwrap_or(""));
                let parent_cfg = state
                    .inputs
                    .top()
                    .map(|s| s.cfg().clone())
                    .unwrap_or_else(crate::hook::HookConfig::default_template);
                let src = crate::io::input::InputSource::open_file(path, &parent_cfg)?;
                state.post_push = Some(src);
                Ok(DispatchOutcome::Continue)
            }
            b"source" => {
                let path_buf = std::str::from_utf8(arg).unwrap_or("").to_string();
                let path = Path::new(&path_buf);
                let mut host = state.take_script();
                let result = {
                    let mut parser = ParserHandle::new(state);
                    host.load(path, &mut parser)
                };
                state.put_script(host);
                result.map_err(|e| MucglyError::ScriptEval(e.0))?;
                Ok(DispatchOutcome::Continue)
            }
            b"block" => {
                if let Some(sink) = state.outputs.top_mut() {
                    sink.block();
                }
                Ok(DispatchOutcome::Continue)
            }
            b"unblock" => {
                if let Some(sink) = state.outputs.top_mut() {
                    sink.unblock();
                }
                Ok(DispatchOutcome::Continue)
            }
            b"comment" => Ok(DispatchOutcome::Continue),
            b"exit" => Ok(DispatchOutcome::Terminate),
            other => Err(MucglyError::UnknownDirective {
                name: String::from_utf8_lossy(other).into_owned(),
            }),
        }
    }
}

fn set_active_hook(state: &mut ParseState, slot: HookSlot, value: Vec<u8>) -> Result<()> {
    if let Some(src) = state.inputs.top_mut() {
        src.cfg_mut().set_hook(slot, value)?;
    }
    Ok(())
}

/// Split `:keyword rest` on the first separator byte (space). With no
/// separator, the whole slice is the keyword and the argument is empty.
fn split_directive(rest: &[u8]) -> (&[u8], &[u8]) {
    match rest.iter().position(|&b| b == b' ') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, &[]),
    }
}
