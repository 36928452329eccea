//! Mock serial port implementation for testing
//!
//! This module provides a mock serial port that can be used to test the
//! SKSTACK client without requiring actual hardware. Each queued chunk is
//! delivered by exactly one read, so tests control where reads split the
//! stream. Once the queue is empty reads report end-of-stream.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Mock serial port that simulates bidirectional communication
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Chunks to be read from the port (incoming)
    rx_chunks: Arc<Mutex<VecDeque<Vec<u8>>>>,
    /// Simulated errors
    next_error: Arc<Mutex<Option<io::Error>>>,
}

/// Poisoning only happens if a test panicked while holding the lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be delivered by one read
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_chunks).push_back(data.to_vec());
    }

    /// Queue several reads
    pub fn queue_rx_chunks<'a>(&self, chunks: impl IntoIterator<Item = &'a [u8]>) {
        let mut rx = lock(&self.rx_chunks);
        rx.extend(chunks.into_iter().map(<[u8]>::to_vec));
    }

    /// Queue data delivered one byte per read
    pub fn queue_rx_bytewise(&self, data: &[u8]) {
        let mut rx = lock(&self.rx_chunks);
        rx.extend(data.iter().map(|&b| vec![b]));
    }

    /// Number of reads still queued
    pub fn pending_reads(&self) -> usize {
        lock(&self.rx_chunks).len()
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        lock(&self.tx_buffer).clone()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        lock(&self.tx_buffer).clear();
        lock(&self.rx_chunks).clear();
    }

    /// Set an error to be returned on the next operation
    pub fn set_next_error(&self, error: io::Error) {
        *lock(&self.next_error) = Some(error);
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        let mut rx = lock(&self.rx_chunks);
        if let Some(mut chunk) = rx.pop_front() {
            let n = chunk.len().min(buf.remaining());
            buf.put_slice(&chunk[..n]);
            if n < chunk.len() {
                rx.push_front(chunk.split_off(n));
            }
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockSerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        lock(&self.tx_buffer).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
