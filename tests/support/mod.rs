//! Shared test support: an in-memory `ScriptHost` stub for integration
//! tests, independent of the `demos/` driver's own copy so tests never
//! depend on a binary target.

use std::path::Path;

use mucgly::{HostError, ParserHandle, ScriptHost};

#[derive(Debug)]
pub struct StubHost;

impl ScriptHost for StubHost {
    fn eval(&mut self, body: &[u8], _parser: &mut ParserHandle) -> Result<Vec<u8>, HostError> {
        let text = std::str::from_utf8(body).map_err(|e| HostError::new(e.to_string()))?.trim();
        if let Some(inner) = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
            return Ok(inner.as_bytes().to_vec());
        }
        let sum: Result<i64, HostError> = text
            .split('+')
            .map(|tok| tok.trim().parse::<i64>().map_err(|_| HostError::new(format!("bad token {tok:?}"))))
            .try_fold(0i64, |acc, tok| tok.map(|n| acc + n));
        sum.map(|n| n.to_string().into_bytes())
    }

    fn exec(&mut self, _body: &[u8], _parser: &mut ParserHandle) -> Result<(), HostError> {
        Ok(())
    }

    fn load(&mut self, path: &Path, parser: &mut ParserHandle) -> Result<(), HostError> {
        parser.push_input(path).map_err(|e| HostError::new(e.to_string()))
    }
}
