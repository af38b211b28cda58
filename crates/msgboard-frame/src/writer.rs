use std::io::{ErrorKind, Write};

use bytes::{Bytes, BytesMut};
use msgboard_transport::BoardStream;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete terminator-delimited frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    terminator: Bytes,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T, terminator: impl Into<Bytes>) -> Self {
        Self::with_config(inner, terminator, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, terminator: impl Into<Bytes>, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            terminator: terminator.into(),
            config,
        }
    }

    /// Append the terminator to `body` and send the whole frame (blocking).
    pub fn send(&mut self, body: &[u8]) -> Result<()> {
        if body.len() > self.config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: body.len(),
                max: self.config.max_frame_size,
            });
        }

        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        encode_frame(body, &self.terminator, &mut buf);
        let result = self.write_all_retrying(&buf);
        self.buf = buf;
        result
    }

    /// Send bytes that already end in the terminator.
    ///
    /// Responses are encoded as complete wire text by the protocol layer, so
    /// they go out verbatim.
    pub fn send_encoded(&mut self, wire: &[u8]) -> Result<()> {
        self.write_all_retrying(wire)
    }

    fn write_all_retrying(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<BoardStream> {
    /// Create a frame writer for `BoardStream` and apply write timeout from config.
    pub fn with_config_stream(
        inner: BoardStream,
        terminator: impl Into<Bytes>,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, terminator, config))
    }
}
