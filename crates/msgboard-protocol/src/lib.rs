//! Delimiter-based command grammar for the msgboard wire protocol.
//!
//! A frame body is a command word followed by fields:
//!
//! ```text
//! POST}+{Alice}+{Hello}+{Hi there}#{Bob}+{T2}+{M2}}&{{
//! ^^^^   ^^^^^   ^^^^^   ^^^^^^^^   ^^^ ...           ^^^^^ terminator
//! word   author  title   message    next triple
//! ```
//!
//! `}+{` separates fields, `}#{` separates batched payload groups and `}}&{{`
//! ends the transmission. The three sequences are configurable through
//! [`Delimiters`].

pub mod command;
pub mod delimiters;
pub mod error;
pub mod parser;
pub mod response;

pub use command::{Command, PostPayload};
pub use delimiters::{Delimiters, FIELD_DELIMITER, MESSAGE_SEPARATOR, TRANSMISSION_TERMINATOR};
pub use error::{ParseError, ProtocolError};
pub use parser::{parse, parse_bytes, tokenize};
pub use response::{Response, ResponseWord};
