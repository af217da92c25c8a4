//! Calculator client session.
//!
//! One session owns one connection. Each iteration prompts, parses, sends
//! one request and waits for one response. Invalid input never reaches the
//! network. After [`MAX_FAILURES`] consecutive send/receive failures the
//! session is aborted.
//!
//! A receive that fails (for instance on a read timeout) leaves its reply
//! owed. The session keeps count of owed replies and of the bytes of a record
//! cut off mid-read, and discards late replies before reading the answer to
//! the request just sent.
use std::io::{self, BufRead, Read, Write};

use log::{debug, warn};

use crate::{
    error::{CalcError, Result},
    parser,
    protocol::{self, RESPONSE_LEN, Request, Response, Status},
};

/// Consecutive send/receive failures after which the session aborts.
pub const MAX_FAILURES: u32 = 3;

/// Text shown before reading each line.
pub const PROMPT: &str = "Insert operation: ";

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The close signal was sent.
    Closed,
    /// Too many consecutive I/O failures.
    Aborted,
}

/// A connected client.
pub struct ClientSession<S: Read + Write> {
    stream: S,
    failures: u32,
    // Replies to earlier requests that have not been read yet.
    owed: u32,
    // Leading bytes of a response record whose read was cut off.
    partial: Vec<u8>,
}

impl<S: Read + Write> ClientSession<S> {
    /// Wrap an established connection.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            failures: 0,
            owed: 0,
            partial: Vec::with_capacity(RESPONSE_LEN),
        }
    }

    /// Current count of consecutive failures.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Replies the server still owes for requests whose receive failed.
    pub fn owed_replies(&self) -> u32 {
        self.owed
    }

    /// Send one request and, unless it is the close signal, wait for the
    /// response.
    ///
    /// The close signal is not answered by the server, so `Ok(None)` is
    /// returned as soon as it is sent. Failures bump the failure counter; a
    /// completed exchange resets it.
    pub fn round_trip(&mut self, request: &Request) -> Result<Option<Response>> {
        if let Err(e) = protocol::write_request(&mut self.stream, request) {
            self.failures += 1;
            return Err(CalcError::Send(e));
        }
        debug!("Sent {:?}", request);

        if request.is_close() {
            self.failures = 0;
            return Ok(None);
        }

        match self.read_reply() {
            Ok(response) => {
                self.failures = 0;
                debug!("Received {:?}", response);
                Ok(Some(response))
            }
            Err(e) => {
                self.failures += 1;
                self.owed += 1;
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    Err(CalcError::Disconnected)
                } else {
                    Err(CalcError::Receive(e))
                }
            }
        }
    }

    /// Read the reply to the latest request, discarding replies still owed
    /// for earlier ones.
    fn read_reply(&mut self) -> io::Result<Response> {
        loop {
            let response = self.read_record()?;
            if self.owed == 0 {
                return Ok(response);
            }
            self.owed -= 1;
            debug!("Discarding late reply {:?}", response);
        }
    }

    /// Complete one response record, keeping partial bytes across failures.
    fn read_record(&mut self) -> io::Result<Response> {
        let mut buf = [0u8; RESPONSE_LEN];
        while self.partial.len() < RESPONSE_LEN {
            let want = RESPONSE_LEN - self.partial.len();
            match self.stream.read(&mut buf[..want]) {
                Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(n) => self.partial.extend_from_slice(&buf[..n]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        buf.copy_from_slice(&self.partial);
        self.partial.clear();
        Ok(Response::decode(&buf))
    }

    /// Drive the session from `input`, writing prompts, results and
    /// diagnostics to `output`.
    ///
    /// End of input behaves like typing the close signal.
    pub fn run<I: BufRead, O: Write>(&mut self, mut input: I, mut output: O) -> Result<SessionEnd> {
        let mut line = String::new();
        loop {
            if self.failures >= MAX_FAILURES {
                writeln!(
                    output,
                    "Error: communication failed with the server, closing the app"
                )?;
                warn!("Aborting after {} consecutive failures", self.failures);
                return Ok(SessionEnd::Aborted);
            }

            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            let request = if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                Request::close()
            } else {
                match parser::parse_line(&line).map_err(CalcError::from) {
                    Ok(request) => request,
                    Err(e) => {
                        writeln!(output, "Error: {e}")?;
                        continue;
                    }
                }
            };

            match self.round_trip(&request) {
                Ok(None) => return Ok(SessionEnd::Closed),
                Ok(Some(response)) => writeln!(output, "{}", describe(&response))?,
                Err(e) => writeln!(output, "Error: {e}, please check and retry")?,
            }
        }
    }
}

/// Render a response the way the console shows it.
pub fn describe(response: &Response) -> String {
    match response.status() {
        Status::Ok(result) => format!("Result: {result}"),
        Status::InvalidOperation => "Error: operation invalid".to_string(),
        Status::DivisionByZero => "Error: division by zero".to_string(),
        Status::Unknown(code) => format!("Error: unknown error (code {code})"),
    }
}
