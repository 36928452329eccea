//! # Utility Modules
//!
//! This module provides common utility functions and types used throughout
//! the skstack-rs crate: the receive buffer, hex formatting and logging
//! helpers.

pub mod hex;
pub mod iobuffer;
pub mod logging;

// Re-export commonly used types and functions
pub use hex::{decode_hex, format_hex_compact, pretty_hex};
pub use iobuffer::{IoBufferError, UnreadBuffer};
pub use logging::{escape_line, LogThrottle};
