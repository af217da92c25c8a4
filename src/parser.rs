//! Turns a line typed by the user into a [`Request`].
//!
//! Accepted grammar: a line starting with `=` closes the session, otherwise
//! `<op> <int> <int>` separated by whitespace with `<op>` one of `+ - * /`.

use crate::error::ParseError;
use crate::protocol::{Operation, Request};

/// Longest accepted line, excluding the line terminator.
pub const MAX_LINE_LEN: usize = 64;

/// Parse one line of user input.
///
/// A rejected line must not be sent; the caller reports the error and
/// prompts again.
pub fn parse_line(line: &str) -> Result<Request, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(ParseError::Empty);
    }
    if line.len() > MAX_LINE_LEN {
        return Err(ParseError::TooLong {
            len: line.len(),
            max: MAX_LINE_LEN,
        });
    }
    if line.starts_with('=') {
        return Ok(Request::close());
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(ParseError::TokenCount(tokens.len()));
    }
    let operation = parse_operator(tokens[0])?;
    let operand1 = parse_operand(tokens[1])?;
    let operand2 = parse_operand(tokens[2])?;
    Ok(Request::new(operation, operand1, operand2))
}

fn parse_operator(token: &str) -> Result<Operation, ParseError> {
    match token {
        "+" => Ok(Operation::Add),
        "-" => Ok(Operation::Subtract),
        "*" => Ok(Operation::Multiply),
        "/" => Ok(Operation::Divide),
        _ => Err(ParseError::UnknownOperator(token.to_string())),
    }
}

fn parse_operand(token: &str) -> Result<i32, ParseError> {
    // Parse wide first so an overflowing number is reported as such.
    let wide: i128 = token
        .parse()
        .map_err(|_| ParseError::NotANumber(token.to_string()))?;
    i32::try_from(wide).map_err(|_| ParseError::OutOfRange(token.to_string()))
}
