//! Multi-client TCP bulletin board.
//!
//! Clients connect over TCP and exchange delimiter-framed text commands to
//! read the board, append posts, or leave. All connections share one
//! in-memory board.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP bind/accept/connect
//! - [`frame`]: Terminator-delimited framing over byte streams
//! - [`protocol`]: Command grammar, parser and response encoding
//! - [`store`]: Shared board state, event log and command handlers
//! - [`server`]: Threaded server and blocking client (behind `server` feature)

/// Re-export transport types.
pub mod transport {
    pub use msgboard_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msgboard_frame::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use msgboard_protocol::*;
}

/// Re-export store types.
pub mod store {
    pub use msgboard_store::*;
}

/// Re-export server and client types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use msgboard_server::*;
}
