//! # SKSTACK Error Handling
//!
//! This module defines the SkStackError enum, which represents the different error
//! types that can occur in the skstack-rs crate, and the owned ProtocolError that
//! decode failures are reported with.

use crate::skstack::error_code::DeviceError;
use crate::skstack::token::{TokenError, TokenErrorKind};
use thiserror::Error;

/// Number of input bytes kept in a [`ProtocolError`] excerpt.
const EXCERPT_LEN: usize = 24;

/// Represents the different error types that can occur in the SKSTACK crate.
#[derive(Debug, Error)]
pub enum SkStackError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// The transport reached end-of-stream while a reply was awaited.
    #[error("Connection closed")]
    ConnectionClosed,

    /// No status line arrived within the configured response timeout.
    #[error("Timed out waiting for response")]
    Timeout,

    /// Malformed bytes were received from the device.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device answered with a FAIL status line.
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    /// A command token contained a space or a line terminator, or was empty.
    #[error("Invalid command token: {0}")]
    InvalidToken(String),

    /// The unread buffer grew past its configured limit.
    #[error("Receive buffer limit exceeded: {limit}")]
    BufferOverflow { limit: usize },

    /// Client options could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catch‑all error for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<std::io::Error> for SkStackError {
    fn from(err: std::io::Error) -> Self {
        SkStackError::SerialPortError(err.to_string())
    }
}

impl From<tokio_serial::Error> for SkStackError {
    fn from(err: tokio_serial::Error) -> Self {
        SkStackError::SerialPortError(err.to_string())
    }
}

/// A non-retryable decode failure with an excerpt of the offending bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} near {excerpt:?}")]
pub struct ProtocolError {
    pub kind: TokenErrorKind,
    pub excerpt: String,
}

impl ProtocolError {
    pub fn new(kind: TokenErrorKind, input: &[u8]) -> Self {
        let end = input.len().min(EXCERPT_LEN);
        ProtocolError {
            kind,
            excerpt: String::from_utf8_lossy(&input[..end]).into_owned(),
        }
    }
}

impl<'a> From<TokenError<'a>> for ProtocolError {
    fn from(err: TokenError<'a>) -> Self {
        ProtocolError::new(err.kind, err.input)
    }
}
