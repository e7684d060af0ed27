//! HTTP-style request head reading
//!
//! Both ports start with a plain request head terminated by CRLFCRLF. Only
//! the terminator matters here; request line and headers are not validated.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{HandshakeError, Result};
use crate::protocol::constants::{HEAD_READ_SIZE, HEAD_TERMINATOR, MAX_HEAD_SIZE};

/// A request head and whatever arrived after it in the same reads
#[derive(Debug, Clone)]
pub struct RequestHead {
    /// Request line and headers, including the terminator
    pub head: Bytes,
    /// Bytes received after the terminator
    pub leftover: Bytes,
}

/// Offset just past the first CRLFCRLF in `buf`, if present
pub fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
        .map(|pos| pos + HEAD_TERMINATOR.len())
}

/// Accumulates received bytes until a complete head is present
///
/// Each push only scans the new bytes plus the few before them that could
/// start a terminator split across reads.
#[derive(Debug)]
pub struct HeadBuffer {
    buf: BytesMut,
}

impl HeadBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(HEAD_READ_SIZE),
        }
    }

    /// Append `data` and return the head once the terminator has arrived
    ///
    /// Fails with [`HandshakeError::HeadTooLarge`] if no terminator shows up
    /// within [`MAX_HEAD_SIZE`] bytes. After a head is returned the buffer is
    /// empty and can collect another one.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<RequestHead>> {
        let search_from = self.buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
        self.buf.extend_from_slice(data);

        if let Some(end) = find_head_end(&self.buf[search_from..]) {
            let mut head = std::mem::take(&mut self.buf);
            let leftover = head.split_off(search_from + end);
            return Ok(Some(RequestHead {
                head: head.freeze(),
                leftover: leftover.freeze(),
            }));
        }

        if self.buf.len() > MAX_HEAD_SIZE {
            return Err(HandshakeError::HeadTooLarge(MAX_HEAD_SIZE).into());
        }
        Ok(None)
    }

    /// Bytes buffered so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for HeadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Read from `reader` until a complete head has arrived
///
/// Fails with [`HandshakeError::UnexpectedEof`] if the peer closes first and
/// with [`HandshakeError::HeadTooLarge`] if no terminator shows up within
/// [`MAX_HEAD_SIZE`] bytes.
pub async fn read_head<R>(reader: &mut R) -> Result<RequestHead>
where
    R: AsyncRead + Unpin,
{
    let mut buf = HeadBuffer::new();
    let mut chunk = [0u8; HEAD_READ_SIZE];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(HandshakeError::UnexpectedEof.into());
        }

        if let Some(head) = buf.push(&chunk[..n])? {
            return Ok(head);
        }
    }
}
