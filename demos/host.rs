//! A minimal illustrative `ScriptHost`: a tiny integer/string expression
//! evaluator, just enough to drive the demo driver and the integration
//! tests. Not a shipped scripting language — the real embedded interpreter
//! is an external collaborator (see the crate's top-level docs).

use std::path::Path;

use mucgly::{HostError, ParserHandle, ScriptHost};

#[derive(Debug)]
pub struct DemoHost;

impl ScriptHost for DemoHost {
    fn eval(&mut self, body: &[u8], _parser: &mut ParserHandle) -> Result<Vec<u8>, HostError> {
        let text = std::str::from_utf8(body).map_err(|e| HostError::new(e.to_string()))?;
        eval_expr(text.trim()).map(|s| s.into_bytes())
    }

    fn exec(&mut self, body: &[u8], parser: &mut ParserHandle) -> Result<(), HostError> {
        let result = self.eval(body, parser)?;
        let _ = result;
        Ok(())
    }

    fn load(&mut self, path: &Path, parser: &mut ParserHandle) -> Result<(), HostError> {
        parser.push_input(path).map_err(|e| HostError::new(e.to_string()))
    }
}

/// A quoted string literal, or an integer arithmetic expression with
/// `+ - * /` and no operator precedence beyond left-to-right evaluation.
fn eval_expr(text: &str) -> Result<String, HostError> {
    if let Some(inner) = text.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Ok(inner.to_string());
    }

    let mut tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(HostError::new("empty expression"));
    }
    let mut acc: i64 = match tokens.remove(0) {
        Token::Num(n) => n,
        Token::Op(op) => return Err(HostError::new(format!("expression cannot start with '{op}'"))),
    };
    while tokens.len() >= 2 {
        let op = match tokens.remove(0) {
            Token::Op(op) => op,
            Token::Num(_) => return Err(HostError::new("expected operator")),
        };
        let rhs = match tokens.remove(0) {
            Token::Num(n) => n,
            Token::Op(_) => return Err(HostError::new("expected number")),
        };
        acc = match op {
            '+' => acc + rhs,
            '-' => acc - rhs,
            '*' => acc * rhs,
            '/' => {
                if rhs == 0 {
                    return Err(HostError::new("division by zero"));
                }
                acc / rhs
            }
            _ => return Err(HostError::new(format!("unknown operator '{op}'"))),
        };
    }
    Ok(acc.to_string())
}

enum Token {
    Num(i64),
    Op(char),
}

fn tokenize(text: &str) -> Result<Vec<Token>, HostError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() {
            let mut num = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    num.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Num(num.parse().map_err(|_| HostError::new("bad integer"))?));
        } else if "+-*/".contains(c) {
            tokens.push(Token::Op(c));
            chars.next();
        } else {
            return Err(HostError::new(format!("unexpected character '{c}'")));
        }
    }
    Ok(tokens)
}
