use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{
    encode_frame, find_terminator, resume_offset, take_frame, DEFAULT_MAX_FRAME_SIZE,
};
use crate::error::FrameError;

/// `tokio_util` codec with the same framing rules as [`crate::FrameReader`].
///
/// Use with `FramedRead`/`FramedWrite` or `Framed` to drive board
/// connections from an async runtime.
#[derive(Debug, Clone)]
pub struct TerminatorCodec {
    terminator: Bytes,
    max_frame_size: usize,
    scanned: usize,
}

impl TerminatorCodec {
    pub fn new(terminator: impl Into<Bytes>) -> Self {
        Self::with_max_frame_size(terminator, DEFAULT_MAX_FRAME_SIZE)
    }

    pub fn with_max_frame_size(terminator: impl Into<Bytes>, max_frame_size: usize) -> Self {
        Self {
            terminator: terminator.into(),
            max_frame_size,
            scanned: 0,
        }
    }
}

impl Decoder for TerminatorCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match find_terminator(src, &self.terminator, self.scanned) {
            Some(pos) => {
                self.scanned = 0;
                Ok(Some(take_frame(src, pos, self.terminator.len())))
            }
            None if src.len() > self.max_frame_size => Err(FrameError::FrameTooLarge {
                size: src.len(),
                max: self.max_frame_size,
            }),
            None => {
                self.scanned = resume_offset(src.len(), self.terminator.len());
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::ConnectionClosed),
        }
    }
}

impl Encoder<Bytes> for TerminatorCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame_size,
            });
        }
        encode_frame(&item, &self.terminator, dst);
        Ok(())
    }
}
