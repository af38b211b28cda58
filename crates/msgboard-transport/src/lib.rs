//! TCP transport for the msgboard bulletin board.
//!
//! This is the lowest layer of msgboard. It owns socket setup (bind, accept,
//! connect) and hands out [`BoardStream`] values that the framing layer reads
//! from and writes to.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{TcpTransport, DEFAULT_PORT};
pub use traits::BoardStream;
