//! Unit tests for the `SkStackError` enum and its associated `Display` trait implementation.

use skstack_rs::error::{ProtocolError, SkStackError};
use skstack_rs::skstack::error_code::map_status_text;
use skstack_rs::skstack::token::TokenErrorKind;

/// Tests that the `SerialPortError` variant is correctly formatted.
#[test]
fn test_serial_port_error() {
    let err = SkStackError::SerialPortError("Test error".to_string());
    assert_eq!(err.to_string(), "Serial port error: Test error");
}

/// Tests that I/O errors are reported as serial port errors.
#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
    let err: SkStackError = io.into();
    assert_eq!(err.to_string(), "Serial port error: unplugged");
}

/// Tests the fixed-text variants.
#[test]
fn test_unit_variants() {
    assert_eq!(SkStackError::ConnectionClosed.to_string(), "Connection closed");
    assert_eq!(SkStackError::Timeout.to_string(), "Timed out waiting for response");
}

/// Tests that protocol errors carry the kind and an excerpt of the input.
#[test]
fn test_protocol_error() {
    let err = ProtocolError::new(TokenErrorKind::InvalidHexDigit(b'Z'), b"2Z\r\n");
    assert_eq!(err.excerpt, "2Z\r\n");

    let err = SkStackError::from(err);
    assert_eq!(err.to_string(), "Protocol error: invalid hex digit 0x5A near \"2Z\\r\\n\"");
}

/// Tests that long excerpts are truncated.
#[test]
fn test_protocol_error_excerpt_is_bounded() {
    let input = [b'A'; 100];
    let err = ProtocolError::new(TokenErrorKind::Truncated, &input);
    assert!(err.excerpt.len() < input.len());
}

/// Tests that the `Device` variant shows the code, its meaning and the text.
#[test]
fn test_device_error() {
    let err = SkStackError::from(map_status_text(b"ER04 unknown"));
    assert_eq!(err.to_string(), "Device error: ER04 (unsupported command): unknown");

    let err = SkStackError::from(map_status_text(b"ER10"));
    assert_eq!(err.to_string(), "Device error: ER10 (command accepted but execution failed)");
}

/// Tests that the `InvalidToken` variant is correctly formatted.
#[test]
fn test_invalid_token_error() {
    let err = SkStackError::InvalidToken("contains a space".to_string());
    assert_eq!(err.to_string(), "Invalid command token: contains a space");
}

/// Tests that the `BufferOverflow` variant is correctly formatted.
#[test]
fn test_buffer_overflow_error() {
    let err = SkStackError::BufferOverflow { limit: 4096 };
    assert_eq!(err.to_string(), "Receive buffer limit exceeded: 4096");
}

/// Tests that the `Other` variant is correctly formatted.
#[test]
fn test_other_error() {
    let err = SkStackError::Other("Some other error".to_string());
    assert_eq!(err.to_string(), "Other error: Some other error");
}
