//! Client-server communication protocol definitions.
//!
//! This module defines the two fixed-size records exchanged between the
//! calculator client and server over TCP connections. There is no length
//! prefix and no delimiter: both ends read and write exactly
//! [`REQUEST_LEN`] or [`RESPONSE_LEN`] bytes.
//!
//! ```text
//! request:  [tag: u8] [operand1: i32 BE] [operand2: i32 BE]   (9 bytes)
//! response: [result: i32 BE] [error: i32 BE]                  (8 bytes)
//! ```
//!
//! Every multi-byte field travels in network byte order.

use std::io::{self, Read, Write};

/// Size of a request record on the wire.
pub const REQUEST_LEN: usize = 9;

/// Size of a response record on the wire.
pub const RESPONSE_LEN: usize = 8;

/// `error` value of a successful response.
pub const ERROR_NONE: i32 = 0;
/// `error` value for an unsupported operation tag.
pub const ERROR_INVALID_OPERATION: i32 = 1;
/// `error` value for a division with a zero divisor.
pub const ERROR_DIVISION_BY_ZERO: i32 = 2;

/// Operation designated by the tag byte of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`, truncating toward zero.
    Divide,
    /// `=`, ends the session. The server never answers it.
    Close,
}

impl Operation {
    /// The tag byte sent on the wire.
    pub fn tag(self) -> u8 {
        match self {
            Operation::Add => b'+',
            Operation::Subtract => b'-',
            Operation::Multiply => b'*',
            Operation::Divide => b'/',
            Operation::Close => b'=',
        }
    }

    /// Map a tag byte back to an operation, `None` for unsupported tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'+' => Some(Operation::Add),
            b'-' => Some(Operation::Subtract),
            b'*' => Some(Operation::Multiply),
            b'/' => Some(Operation::Divide),
            b'=' => Some(Operation::Close),
            _ => None,
        }
    }
}

/// A validated client request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    /// What the server must compute.
    pub operation: Operation,
    /// Left operand.
    pub operand1: i32,
    /// Right operand.
    pub operand2: i32,
}

impl Request {
    /// Build a request.
    pub fn new(operation: Operation, operand1: i32, operand2: i32) -> Self {
        Self {
            operation,
            operand1,
            operand2,
        }
    }

    /// The close signal. Operands are unused and sent as zero.
    pub fn close() -> Self {
        Self::new(Operation::Close, 0, 0)
    }

    /// Whether this request ends the session.
    pub fn is_close(&self) -> bool {
        self.operation == Operation::Close
    }

    /// Encode into a wire record.
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut buf = [0u8; REQUEST_LEN];
        buf[0] = self.operation.tag();
        buf[1..5].copy_from_slice(&self.operand1.to_be_bytes());
        buf[5..9].copy_from_slice(&self.operand2.to_be_bytes());
        buf
    }
}

/// A request as read off the wire, before its tag is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRecord {
    /// Raw operation tag.
    pub tag: u8,
    /// Left operand, host byte order.
    pub operand1: i32,
    /// Right operand, host byte order.
    pub operand2: i32,
}

impl RequestRecord {
    /// Decode a wire record.
    pub fn decode(buf: &[u8; REQUEST_LEN]) -> Self {
        Self {
            tag: buf[0],
            operand1: i32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]),
            operand2: i32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]),
        }
    }

    /// The designated operation, `None` if the tag is unsupported.
    pub fn operation(&self) -> Option<Operation> {
        Operation::from_tag(self.tag)
    }
}

impl From<Request> for RequestRecord {
    fn from(request: Request) -> Self {
        Self {
            tag: request.operation.tag(),
            operand1: request.operand1,
            operand2: request.operand2,
        }
    }
}

/// Server response record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// Meaningful only when `error` is [`ERROR_NONE`].
    pub result: i32,
    /// Status code.
    pub error: i32,
}

/// Decoded meaning of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Computation succeeded.
    Ok(i32),
    /// The server did not recognise the operation.
    InvalidOperation,
    /// Division by zero was requested.
    DivisionByZero,
    /// A code this client does not know.
    Unknown(i32),
}

impl Response {
    /// A successful result.
    pub fn ok(result: i32) -> Self {
        Self {
            result,
            error: ERROR_NONE,
        }
    }

    /// Unsupported operation.
    pub fn invalid_operation() -> Self {
        Self {
            result: 0,
            error: ERROR_INVALID_OPERATION,
        }
    }

    /// Division by zero.
    pub fn division_by_zero() -> Self {
        Self {
            result: 0,
            error: ERROR_DIVISION_BY_ZERO,
        }
    }

    /// Interpret the error code.
    pub fn status(&self) -> Status {
        match self.error {
            ERROR_NONE => Status::Ok(self.result),
            ERROR_INVALID_OPERATION => Status::InvalidOperation,
            ERROR_DIVISION_BY_ZERO => Status::DivisionByZero,
            code => Status::Unknown(code),
        }
    }

    /// Encode into a wire record.
    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        let mut buf = [0u8; RESPONSE_LEN];
        buf[0..4].copy_from_slice(&self.result.to_be_bytes());
        buf[4..8].copy_from_slice(&self.error.to_be_bytes());
        buf
    }

    /// Decode a wire record.
    pub fn decode(buf: &[u8; RESPONSE_LEN]) -> Self {
        Self {
            result: i32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            error: i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }
}

/// Write one request record and flush.
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> io::Result<()> {
    writer.write_all(&request.encode())?;
    writer.flush()
}

/// Write one response record and flush.
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> io::Result<()> {
    writer.write_all(&response.encode())?;
    writer.flush()
}

/// Read one request record.
///
/// Returns `Ok(None)` when the peer closed the connection cleanly between
/// records. A record cut short is an [`io::ErrorKind::UnexpectedEof`] error.
pub fn read_request<R: Read>(reader: &mut R) -> io::Result<Option<RequestRecord>> {
    let mut buf = [0u8; REQUEST_LEN];
    if !read_record(reader, &mut buf)? {
        return Ok(None);
    }
    Ok(Some(RequestRecord::decode(&buf)))
}

/// Read one response record. Any EOF is an error here: the client always
/// expects an answer.
pub fn read_response<R: Read>(reader: &mut R) -> io::Result<Response> {
    let mut buf = [0u8; RESPONSE_LEN];
    reader.read_exact(&mut buf)?;
    Ok(Response::decode(&buf))
}

/// Fill `buf` completely. `Ok(false)` if EOF came before the first byte.
fn read_record<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("record truncated after {filled} of {} bytes", buf.len()),
                ));
            }
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}
