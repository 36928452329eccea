//! # UnreadBuffer - Receive Buffer for Line Framing
//!
//! This module provides the appendable buffer holding bytes received from the
//! module but not yet consumed by the line classifier.
//!
//! ## Features
//!
//! - Appends whole read segments, consumes only whole lines from the front
//! - Contiguous storage (`BytesMut`), so lines and tokens spanning two reads
//!   are scanned without copying
//! - Consumed lines are split off as `Bytes` without copying
//! - Optional capacity limit for callers that want bounded memory
//!
//! ## Usage
//!
//! ```rust
//! use skstack_rs::util::UnreadBuffer;
//!
//! let mut buffer = UnreadBuffer::new();
//! buffer.write(b"OK\r\nEVE").unwrap();
//!
//! let line = buffer.consume(4);
//! assert_eq!(&line[..], b"OK\r\n");
//! assert_eq!(buffer.unread(), b"EVE");
//! ```

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Errors that can occur during UnreadBuffer operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IoBufferError {
    #[error("Capacity limit exceeded: {limit}")]
    CapacityExceeded { limit: usize },
}

/// Bytes received from the transport that have not been classified yet.
#[derive(Debug, Clone)]
pub struct UnreadBuffer {
    data: BytesMut,
    /// Maximum capacity limit (None = unlimited)
    capacity_limit: Option<usize>,
}

impl UnreadBuffer {
    /// Size reserved ahead of each transport read
    pub const READ_CHUNK_SIZE: usize = 1024;

    pub fn new() -> Self {
        Self {
            data: BytesMut::with_capacity(Self::READ_CHUNK_SIZE),
            capacity_limit: None,
        }
    }

    /// Set maximum capacity limit
    pub fn set_capacity_limit(&mut self, limit: Option<usize>) {
        self.capacity_limit = limit;
    }

    /// Check whether `additional` more bytes would fit under the limit
    pub fn try_reserve(&self, additional: usize) -> Result<(), IoBufferError> {
        match self.capacity_limit {
            Some(limit) if self.len() + additional > limit => {
                Err(IoBufferError::CapacityExceeded { limit })
            }
            _ => Ok(()),
        }
    }

    /// Append a received segment
    pub fn write(&mut self, data: &[u8]) -> Result<usize, IoBufferError> {
        self.try_reserve(data.len())?;
        self.data.extend_from_slice(data);
        Ok(data.len())
    }

    /// Append whatever a single read from `reader` delivers.
    ///
    /// Returns the number of bytes appended; zero means end-of-stream or a full
    /// buffer (check [`try_reserve`](Self::try_reserve) first). With a capacity
    /// limit the read never takes more than the remaining headroom.
    /// The read is cancellation safe: if the future is dropped nothing is
    /// appended and nothing already buffered is lost.
    pub async fn fill_from<R>(&mut self, reader: &mut R) -> std::io::Result<usize>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let headroom = match self.capacity_limit {
            Some(limit) => limit.saturating_sub(self.len()).min(Self::READ_CHUNK_SIZE),
            None => Self::READ_CHUNK_SIZE,
        };
        if headroom == 0 {
            return Ok(0);
        }

        self.data.reserve(headroom);
        (&mut *reader).take(headroom as u64).read_buf(&mut self.data).await
    }

    /// The unconsumed bytes
    pub fn unread(&self) -> &[u8] {
        &self.data
    }

    /// Split off the first `count` bytes
    pub fn consume(&mut self, count: usize) -> Bytes {
        let count = count.min(self.len());
        self.data.split_to(count).freeze()
    }

    /// Drop the first `count` bytes
    pub fn advance(&mut self, count: usize) {
        let count = count.min(self.len());
        self.data.advance(count);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for UnreadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut buffer = UnreadBuffer::new();
        assert_eq!(buffer.write(b"OK\r\n").unwrap(), 4);
        assert_eq!(buffer.len(), 4);

        let line = buffer.consume(2);
        assert_eq!(&line[..], b"OK");
        assert_eq!(buffer.unread(), b"\r\n");

        let rest = buffer.consume(10);
        assert_eq!(&rest[..], b"\r\n");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_capacity_limit() {
        let mut buffer = UnreadBuffer::new();
        buffer.set_capacity_limit(Some(5));
        assert!(buffer.write(b"abc").is_ok());
        assert_eq!(
            buffer.write(b"def"),
            Err(IoBufferError::CapacityExceeded { limit: 5 })
        );
        assert_eq!(buffer.len(), 3);
    }

    #[tokio::test]
    async fn test_fill_from_reader() {
        let mut reader: &[u8] = b"EPONG ";
        let mut buffer = UnreadBuffer::new();
        buffer.write(b"\r\n").unwrap();

        let n = buffer.fill_from(&mut reader).await.unwrap();
        assert_eq!(n, 6);
        assert_eq!(buffer.unread(), b"\r\nEPONG ");
        assert_eq!(buffer.fill_from(&mut reader).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fill_from_respects_limit() {
        let data = [b'A'; 500];
        let mut reader: &[u8] = &data;
        let mut buffer = UnreadBuffer::new();
        buffer.set_capacity_limit(Some(16));
        buffer.write(b"OK").unwrap();

        assert_eq!(buffer.fill_from(&mut reader).await.unwrap(), 14);
        assert_eq!(buffer.len(), 16);
        assert_eq!(reader.len(), 486);
        assert_eq!(buffer.fill_from(&mut reader).await.unwrap(), 0);
    }
}
