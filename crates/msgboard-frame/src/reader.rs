use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use msgboard_transport::BoardStream;

use crate::codec::{find_terminator, resume_offset, take_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete terminator-delimited frames from any `Read` stream.
///
/// Partial reads are handled internally; callers always get complete frames.
/// Bytes received after a terminator stay buffered for the next call, so
/// pipelined frames are returned without touching the stream again.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    terminator: Bytes,
    /// Prefix of `buf` already known not to contain a terminator.
    scanned: usize,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T, terminator: impl Into<Bytes>) -> Self {
        Self::with_config(inner, terminator, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, terminator: impl Into<Bytes>, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            terminator: terminator.into(),
            scanned: 0,
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, even
    /// if an unterminated partial frame was buffered.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = self.try_split() {
                return Ok(frame);
            }

            if self.buf.len() > self.config.max_frame_size {
                return Err(FrameError::FrameTooLarge {
                    size: self.buf.len(),
                    max: self.config.max_frame_size,
                });
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    tracing::debug!(
                        discarded = self.buf.len(),
                        "peer closed with an unterminated frame buffered"
                    );
                }
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Iterate over frames until the first terminal condition.
    ///
    /// The terminal error (closed or failed) is yielded once, then the
    /// iterator ends.
    pub fn frames(&mut self) -> Frames<'_, T> {
        Frames {
            reader: self,
            done: false,
        }
    }

    fn try_split(&mut self) -> Option<Bytes> {
        match find_terminator(&self.buf, &self.terminator, self.scanned) {
            Some(pos) => {
                self.scanned = 0;
                Some(take_frame(&mut self.buf, pos, self.terminator.len()))
            }
            None => {
                self.scanned = resume_offset(self.buf.len(), self.terminator.len());
                None
            }
        }
    }

    /// Bytes received but not yet returned as part of a frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// The terminator this reader splits on.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<BoardStream> {
    /// Create a frame reader for `BoardStream` and apply read timeout from config.
    pub fn with_config_stream(
        inner: BoardStream,
        terminator: impl Into<Bytes>,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, terminator, config))
    }
}

/// Lazy, connection-scoped sequence of frames. See [`FrameReader::frames`].
pub struct Frames<'a, T> {
    reader: &'a mut FrameReader<T>,
    done: bool,
}

impl<T: Read> Iterator for Frames<'_, T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.reader.read_frame();
        if next.is_err() {
            self.done = true;
        }
        Some(next)
    }
}

impl<T: Read> std::iter::FusedIterator for Frames<'_, T> {}

pub(crate) fn transport_to_frame_error(err: msgboard_transport::TransportError) -> FrameError {
    match err {
        msgboard_transport::TransportError::Io(io)
        | msgboard_transport::TransportError::Accept(io) => FrameError::Io(io),
        msgboard_transport::TransportError::Bind { source, .. }
        | msgboard_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::DEFAULT_TERMINATOR;

    fn wire(frames: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        for frame in frames {
            out.extend_from_slice(frame.as_bytes());
            out.extend_from_slice(DEFAULT_TERMINATOR);
        }
        out
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&["GET_BOARD"])), DEFAULT_TERMINATOR);
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.as_ref(), b"GET_BOARD");
    }

    #[test]
    fn read_pipelined_frames_from_one_chunk() {
        let bytes = wire(&["POST}+{a}+{t}+{m", "GET_BOARD", "QUIT"]);
        let mut reader = FrameReader::new(Cursor::new(bytes), DEFAULT_TERMINATOR);

        assert_eq!(reader.read_frame().unwrap().as_ref(), b"POST}+{a}+{t}+{m");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"GET_BOARD");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"QUIT");
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn pipelined_frame_is_returned_without_another_read() {
        let bytes = wire(&["one", "two"]);
        let counting = CountingReader {
            inner: Cursor::new(bytes),
            reads: 0,
        };
        let mut reader = FrameReader::new(counting, DEFAULT_TERMINATOR);

        reader.read_frame().unwrap();
        let reads_after_first = reader.get_ref().reads;
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"two");
        assert_eq!(reader.get_ref().reads, reads_after_first);
    }

    #[test]
    fn byte_by_byte_delivery_yields_identical_frames() {
        let frames = [
            "POST}+{Alice}+{Hello}+{Hi there",
            "GET_BOARD}+{Alice}+{",
            "",
            "POST}+{A}+{T1}+{M1}#{B}+{T2}+{M2",
            "QUIT",
        ];
        let byte_reader = ChunkedReader {
            bytes: wire(&frames),
            pos: 0,
            chunk: 1,
        };
        let mut reader = FrameReader::new(byte_reader, DEFAULT_TERMINATOR);

        let got: Vec<Bytes> = reader
            .frames()
            .take_while(|f| f.is_ok())
            .map(Result::unwrap)
            .collect();
        let expected: Vec<&[u8]> = frames.iter().map(|f| f.as_bytes()).collect();
        assert_eq!(got.len(), frames.len());
        for (got, expected) in got.iter().zip(expected) {
            assert_eq!(got.as_ref(), expected);
        }
    }

    #[test]
    fn odd_chunk_sizes_split_terminator_across_reads() {
        // "beta}}&{" ends in a near-miss of the terminator.
        let frames = ["alpha", "beta}}&{", "gamma"];
        let bytes = wire(&frames);
        for chunk in 1..=7 {
            let chunked = ChunkedReader {
                bytes: bytes.clone(),
                pos: 0,
                chunk,
            };
            let mut reader = FrameReader::new(chunked, DEFAULT_TERMINATOR);
            for expected in frames {
                let frame = reader.read_frame().unwrap();
                assert_eq!(frame.as_ref(), expected.as_bytes(), "chunk size {chunk}");
            }
        }
    }

    #[test]
    fn frames_iterator_ends_after_close() {
        let mut reader = FrameReader::new(Cursor::new(wire(&["a", "b"])), DEFAULT_TERMINATOR);
        let mut frames = reader.frames();
        assert_eq!(frames.next().unwrap().unwrap().as_ref(), b"a");
        assert_eq!(frames.next().unwrap().unwrap().as_ref(), b"b");
        assert!(matches!(
            frames.next(),
            Some(Err(FrameError::ConnectionClosed))
        ));
        assert!(frames.next().is_none());
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()), DEFAULT_TERMINATOR);
        let err = reader.read_frame().unwrap_err();
        assert!(err.is_closed());
    }

    #[test]
    fn connection_closed_mid_frame() {
        let partial = Cursor::new(b"POST}+{half".to_vec());
        let mut reader = FrameReader::new(partial, DEFAULT_TERMINATOR);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.buffered(), b"POST}+{half");
    }

    #[test]
    fn oversized_frame_in_stream() {
        let cfg = FrameConfig {
            max_frame_size: 16,
            ..FrameConfig::default()
        };
        let bytes = vec![b'x'; 1024];
        let mut reader = FrameReader::with_config(Cursor::new(bytes), DEFAULT_TERMINATOR, cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { max: 16, .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            state: 0,
            bytes: wire(&["ok"]),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader, DEFAULT_TERMINATOR);
        assert_eq!(framed.read_frame().unwrap().as_ref(), b"ok");
    }

    #[test]
    fn other_io_errors_are_terminal() {
        let reader = FailingReader(ErrorKind::ConnectionReset);
        let mut framed = FrameReader::new(reader, DEFAULT_TERMINATOR);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::ConnectionReset));
    }

    #[test]
    fn custom_terminator() {
        let mut reader = FrameReader::new(Cursor::new(b"a\r\nb\r\n".to_vec()), &b"\r\n"[..]);
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"a");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"b");
        assert_eq!(reader.terminator(), b"\r\n");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left, DEFAULT_TERMINATOR);
        let mut reader = FrameReader::new(right, DEFAULT_TERMINATOR);

        writer.send(b"GET_BOARD").unwrap();
        writer.send(b"QUIT").unwrap();

        assert_eq!(reader.read_frame().unwrap().as_ref(), b"GET_BOARD");
        assert_eq!(reader.read_frame().unwrap().as_ref(), b"QUIT");
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor, DEFAULT_TERMINATOR);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        assert_eq!(reader.config().max_frame_size, crate::DEFAULT_MAX_FRAME_SIZE);
        let _inner = reader.into_inner();
    }

    struct CountingReader<R> {
        inner: R,
        reads: usize,
    }

    impl<R: Read> Read for CountingReader<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    #[derive(Debug)]
    struct ChunkedReader {
        bytes: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            let n = self.chunk.min(buf.len()).min(self.bytes.len() - self.pos);
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader(ErrorKind);

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(self.0))
        }
    }
}
