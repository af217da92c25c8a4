//! Error
//!
//! This module provides the errors raised by the calculator client and server
//! with [`thiserror`]
//!
use std::io;
use thiserror::Error;

/// Result use the [`CalcError`] as error.
pub type Result<T> = std::result::Result<T, CalcError>;

/// CalcError is the error type shared by the codec, client and server.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error("io error {0}")]
    /// IO relevant errors, including send/receive failures on a connection
    Io(#[from] io::Error),

    /// A user line could not be turned into a request
    #[error(
        "operation format invalid or too big numbers (range: [-2147483648, +2147483647]): {0}"
    )]
    Parse(#[from] ParseError),

    /// Writing a request to the server failed
    #[error("failed to send operation to the server ({0})")]
    Send(#[source] io::Error),

    /// Reading a response from the server failed
    #[error("failed to receive result from the server ({0})")]
    Receive(#[source] io::Error),

    /// The peer closed the connection before a full record arrived
    #[error("connection closed by the server")]
    Disconnected,

    /// The worker pool refused a job
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// Reasons a line of user input is rejected before anything is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing was typed
    #[error("empty input")]
    Empty,

    /// Line exceeds the accepted length
    #[error("input is {len} bytes long, at most {max} are accepted")]
    TooLong {
        /// Length of the rejected line.
        len: usize,
        /// Accepted maximum.
        max: usize,
    },

    /// Expected `<op> <int> <int>`
    #[error("expected 3 tokens, found {0}")]
    TokenCount(usize),

    /// Operator is not one of `+ - * /`
    #[error("unsupported operator `{0}`")]
    UnknownOperator(String),

    /// Operand is not an integer
    #[error("`{0}` is not a number")]
    NotANumber(String),

    /// Operand does not fit in a signed 32-bit integer
    #[error("`{0}` is outside [-2147483648, 2147483647]")]
    OutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_convert_with_question_mark() {
        fn parse(line: &str) -> Result<crate::protocol::Request> {
            Ok(crate::parser::parse_line(line)?)
        }
        let err = parse("banana").unwrap_err();
        assert!(matches!(err, CalcError::Parse(ParseError::TokenCount(1))));
        assert!(err.to_string().starts_with("operation format invalid"));
        assert!(err.to_string().ends_with("expected 3 tokens, found 1"));
    }
}
