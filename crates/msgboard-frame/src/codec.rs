use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};

/// Default transmission terminator: `}}&{{`.
pub const DEFAULT_TERMINATOR: &[u8] = b"}}&{{";

/// Default upper bound on buffered bytes without a terminator: 16 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Find the first terminator occurrence at or after `from`.
///
/// Returns the absolute index of the terminator's first byte. An empty
/// terminator never matches.
pub fn find_terminator(buf: &[u8], terminator: &[u8], from: usize) -> Option<usize> {
    if terminator.is_empty() || from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(terminator.len())
        .position(|window| window == terminator)
        .map(|pos| from + pos)
}

/// Split one complete frame off the front of `src`.
///
/// Returns `None` if `src` doesn't contain a terminator yet. On success the
/// frame body and its terminator are consumed; trailing bytes stay in `src`.
pub fn split_frame(src: &mut BytesMut, terminator: &[u8]) -> Option<Bytes> {
    let pos = find_terminator(src, terminator, 0)?;
    Some(take_frame(src, pos, terminator.len()))
}

pub(crate) fn take_frame(src: &mut BytesMut, pos: usize, terminator_len: usize) -> Bytes {
    let body = src.split_to(pos).freeze();
    let _ = src.split_to(terminator_len);
    body
}

/// Where the next terminator search may start without missing a match that
/// straddles previously scanned bytes.
pub(crate) fn resume_offset(buffered: usize, terminator_len: usize) -> usize {
    buffered.saturating_sub(terminator_len.saturating_sub(1))
}

/// Append `body` followed by the terminator to `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────┬──────────────┐
/// │ Body (any bytes)         │ Terminator   │
/// │ "POST}+{a}+{t}+{m"       │ "}}&{{"      │
/// └──────────────────────────┴──────────────┘
/// ```
pub fn encode_frame(body: &[u8], terminator: &[u8], dst: &mut BytesMut) {
    dst.reserve(body.len() + terminator.len());
    dst.put_slice(body);
    dst.put_slice(terminator);
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum bytes buffered while waiting for a terminator. Default: 16 MiB.
    pub max_frame_size: usize,
    /// Read timeout for blocking operations. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
