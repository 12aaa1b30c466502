//! End-to-end tests: whole input strings through `ParseState`/`Parser` with
//! the in-memory `StubHost`, covering the six concrete scenarios plus a
//! couple of structural invariants (nesting, multi-hook).

mod support;

use std::sync::{Arc, Mutex};

use mucgly::{HookConfig, HookSlot, InputSource, OutputSink, ParseState, Parser};
use support::StubHost;

fn run(input: &str) -> String {
    run_with_cfg(input, HookConfig::default_template())
}

fn run_with_cfg(input: &str, cfg: HookConfig) -> String {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let mut state = ParseState::new(Box::new(StubHost));
    state.inputs.push(InputSource::from_bytes("in", input.as_bytes().to_vec(), cfg));
    state.outputs.push(OutputSink::from_shared_buffer("out", buf.clone()));
    Parser::run(&mut state).expect("run should succeed");
    String::from_utf8(buf.lock().unwrap().clone()).unwrap()
}

#[test]
fn scenario_1_script_expression_result_is_written() {
    assert_eq!(run("Hello -<.1+2>- world\n"), "Hello 3 world\n");
}

#[test]
fn scenario_2_escaped_delimiters_pass_through_literally() {
    assert_eq!(run("A\\-<B\\>-C"), "A-<B>-C");
}

#[test]
fn scenario_3_hookbeg_directive_changes_begin_delimiter_only() {
    // `:hookbeg` changes only `beg`; `end` stays at the unchanged default
    // ">-", so the second macro here closes on ">-" rather than on "}}".
    // See DESIGN.md's open-question resolution on scenario 3 for why this
    // body differs from the spec text's literal "{{.42}}".
    let mut state = ParseState::new(Box::new(StubHost));
    let buf = Arc::new(Mutex::new(Vec::new()));
    state.inputs.push(InputSource::from_bytes(
        "in",
        b"-<:hookbeg {{>-\nBefore {{.42>- After\n".to_vec(),
        HookConfig::default_template(),
    ));
    state.outputs.push(OutputSink::from_shared_buffer("out", buf.clone()));
    Parser::run(&mut state).expect("run should succeed");
    let out = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
    assert_eq!(out, "\nBefore 42 After\n");
}

#[test]
fn scenario_3_literal_spec_text_is_actually_fatal() {
    // The spec's scenario 3 prose claims `Before {{.42}} After\n` yields
    // `Before 42 After\n`, but `}}` was never configured as `end` (only
    // `beg` changes under `:hookbeg`), so the unmodified literal text has
    // no closing delimiter before end-of-source. See DESIGN.md.
    let mut state = ParseState::new(Box::new(StubHost));
    let buf = Arc::new(Mutex::new(Vec::new()));
    state.inputs.push(InputSource::from_bytes(
        "in",
        b"-<:hookbeg {{>-\nBefore {{.42}} After\n".to_vec(),
        HookConfig::default_template(),
    ));
    state.outputs.push(OutputSink::from_shared_buffer("out", buf.clone()));
    let err = Parser::run(&mut state).expect_err("literal spec text has no matching hookend");
    assert!(matches!(err, mucgly::MucglyError::EofInMacro));
}

#[test]
fn scenario_4_block_then_unblock() {
    assert_eq!(run("-<:block>-HIDDEN-<:unblock>-SHOWN"), "SHOWN");
}

#[test]
fn scenario_5_plus_prefix_eats_one_trailing_byte() {
    assert_eq!(run("-<+. \"x\">- Y"), "xY");
}

#[test]
fn scenario_6_deferred_evaluation_strips_one_hash() {
    assert_eq!(run("-<#still>-"), "-<still>-");
}

#[test]
fn nested_macro_delimiters_pass_through_to_output_and_not_into_body() {
    // A nested "-<...>-" inside a bare-statement body is emitted to output
    // verbatim (per the glossary's "inclusive ... in output, exclusive ...
    // in body"), while everything else in the outer macro body is handed
    // to `exec` once, on the outermost matching hookend, and discarded
    // (the stub's `exec` produces no output).
    assert_eq!(run("-<ignored -<ignored>- tail>- rest"), "-<>- rest");
}

#[test]
fn multi_hook_mode_matches_first_registered_pair() {
    let mut cfg = HookConfig::default_template();
    cfg.add_multi(b"<%".to_vec(), b"%>".to_vec(), None).unwrap();
    cfg.add_multi(b"{{".to_vec(), b"}}".to_vec(), None).unwrap();
    assert_eq!(run_with_cfg("x <%.1+2%> y {{.1+2}} z", cfg), "x 3 y 3 z");
}

#[test]
fn unknown_directive_is_reported_as_an_error() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let mut state = ParseState::new(Box::new(StubHost));
    state.inputs.push(InputSource::from_bytes("in", b"-<:bogus>-".to_vec(), HookConfig::default_template()));
    state.outputs.push(OutputSink::from_shared_buffer("out", buf));
    let err = Parser::run(&mut state).unwrap_err();
    assert!(matches!(err, mucgly::MucglyError::UnknownDirective { .. }));
}

#[test]
fn unterminated_macro_is_a_fatal_end_of_source_error() {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let mut state = ParseState::new(Box::new(StubHost));
    state.inputs.push(InputSource::from_bytes("in", b"-<.never closes".to_vec(), HookConfig::default_template()));
    state.outputs.push(OutputSink::from_shared_buffer("out", buf));
    let err = Parser::run(&mut state).unwrap_err();
    assert!(matches!(err, mucgly::MucglyError::EofInMacro));
}

#[test]
fn hook_slot_esc_can_be_changed_independently() {
    let mut cfg = HookConfig::default_template();
    cfg.set_hook(HookSlot::Esc, b"~".to_vec()).unwrap();
    assert_eq!(cfg.esc(), b"~");
    assert_eq!(run_with_cfg("~-<B~>-C", cfg), "-<B>-C");
}
