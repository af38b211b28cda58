//! Terminator-delimited message framing for the msgboard wire protocol.
//!
//! A frame is every byte before an occurrence of the transmission terminator.
//! The terminator is consumed; bytes after it are kept for the next frame.
//! Callers never see partial reads.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::TerminatorCodec;
pub use codec::{
    encode_frame, find_terminator, split_frame, FrameConfig, DEFAULT_MAX_FRAME_SIZE,
    DEFAULT_TERMINATOR,
};
pub use error::{FrameError, Result};
pub use reader::{FrameReader, Frames};
pub use writer::FrameWriter;
