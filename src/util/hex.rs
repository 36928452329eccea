//! # Hex Formatting Utilities
//!
//! Hex helpers used for logging received bytes and by the CLI for datagram
//! payloads. Protocol token decoding lives in `skstack::token`; these helpers
//! are only for human-readable output.
//!
//! ## Usage
//!
//! ```rust
//! use skstack_rs::util::hex::{decode_hex, format_hex_compact};
//!
//! let data = decode_hex("10810001").unwrap();
//! assert_eq!(format_hex_compact(&data), "10 81 00 01");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is automatically stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }
    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Pretty-print hex data with offsets and an ASCII column
pub fn pretty_hex(data: &[u8], bytes_per_line: usize) -> String {
    let bytes_per_line = bytes_per_line.max(1);
    let mut lines = Vec::new();

    for (i, chunk) in data.chunks(bytes_per_line).enumerate() {
        let hex: String = chunk.iter().map(|b| format!("{b:02X} ")).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        lines.push(format!(
            "{:04x}: {:<width$} |{}|",
            i * bytes_per_line,
            hex,
            ascii,
            width = bytes_per_line * 3
        ));
    }

    lines.join("\n")
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "10 81 00 01" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
