#![deny(missing_docs)]
//! # netcalc
//!
//! A remote calculator: the client sends one fixed-size binary request per
//! operation and the server answers with one fixed-size binary response.
//!
//! ## Example Usage
//!
//! ```rust
//! use netcalc::parser::parse_line;
//! use netcalc::server::{dispatch, Dispatch};
//! use netcalc::protocol::{RequestRecord, Response};
//!
//! let request = parse_line("+ 2 3").unwrap();
//! let record = RequestRecord::decode(&request.encode());
//! assert_eq!(dispatch(&record), Dispatch::Reply(Response::ok(5)));
//! ```
pub mod protocol;

pub mod parser;

pub mod evaluator;

pub mod thread_pool;

pub mod server;

pub mod client;

pub mod config;

pub mod error;

pub use crate::client::{ClientSession, SessionEnd};
pub use crate::error::{CalcError, ParseError, Result};
pub use crate::server::CalcServer;
