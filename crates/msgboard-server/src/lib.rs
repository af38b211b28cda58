//! Threaded TCP server and blocking client for the msgboard protocol.
//!
//! [`BoardServer`] accepts connections and runs one detached thread per
//! client against a shared [`msgboard_store::BoardStore`]. [`BoardClient`]
//! speaks the same protocol from the other end.

pub mod client;
pub mod config;
mod connection;
pub mod error;
pub mod server;

pub use client::BoardClient;
pub use config::{ClientConfig, ServerConfig};
pub use error::{Result, ServerError};
pub use server::{BoardServer, ShutdownHandle};
