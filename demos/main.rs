//! A minimal illustrative driver: one input path (or `-` for standard
//! input), one output path (or `-` for standard output). Not a shipped CLI
//! product — the command-line/environmental surface is an external
//! collaborator per the crate's design; this exists so the crate's
//! behavior can be exercised end-to-end without embedding it in a test
//! harness.

mod host;

use std::env;
use std::process::ExitCode;

use mucgly::{EngineOptions, InputSpec, OutputSpec};

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let input_arg = args.next().unwrap_or_else(|| "-".to_string());
    let output_arg = args.next().unwrap_or_else(|| "-".to_string());

    let input = if input_arg == "-" { InputSpec::Stdin } else { InputSpec::File(input_arg.into()) };
    let output = if output_arg == "-" { OutputSpec::Stdout } else { OutputSpec::File(output_arg.into()) };

    let options = EngineOptions::new(input, output, Box::new(host::DemoHost));
    let mut engine = match mucgly::Engine::new(options) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", mucgly::Diagnostic::from_error(&e, None).render());
            return ExitCode::from(e.severity().exit_code() as u8);
        }
    };

    match engine.run() {
        Ok(status) => ExitCode::from(status.code() as u8),
        Err(e) => {
            let location = engine.current_location();
            eprintln!("{}", mucgly::Diagnostic::from_error(&e, location).render());
            ExitCode::from(e.severity().exit_code() as u8)
        }
    }
}
