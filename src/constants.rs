//! SKSTACK IP Protocol Constants
//!
//! This module defines constants used by the SKSTACK IP command/response
//! protocol implementation: line terminators, status tokens, event codes,
//! fixed token widths and the channel table bounds.

// ----------------------------------------------------------------------------
// Line terminators
// ----------------------------------------------------------------------------

/// Default end-of-line sequence
pub const SKSTACK_CRLF: &[u8] = b"\r\n";

/// End-of-line used by the product configuration commands (WOPT/ROPT, ...)
pub const SKSTACK_CR: &[u8] = b"\r";

/// No terminator (command line continues with an inline payload)
pub const SKSTACK_NO_TERMINATOR: &[u8] = b"";

// ----------------------------------------------------------------------------
// Status line tokens
// ----------------------------------------------------------------------------

pub const SKSTACK_STATUS_OK: &[u8] = b"OK";
pub const SKSTACK_STATUS_FAIL: &[u8] = b"FAIL";

/// Length of the error code token carried by a FAIL status (`ER04`, `ER10`, ...)
pub const SKSTACK_ERROR_CODE_LEN: usize = 4;

// ----------------------------------------------------------------------------
// Event codes
// ----------------------------------------------------------------------------

pub const SKSTACK_EVENT_ERXUDP: &[u8] = b"ERXUDP";
pub const SKSTACK_EVENT_EPONG: &[u8] = b"EPONG";
pub const SKSTACK_EVENT_EADDR: &[u8] = b"EADDR";
pub const SKSTACK_EVENT_ENEIGHBOR: &[u8] = b"ENEIGHBOR";
pub const SKSTACK_EVENT_EPANDESC: &[u8] = b"EPANDESC";
pub const SKSTACK_EVENT_EEDSCAN: &[u8] = b"EEDSCAN";
pub const SKSTACK_EVENT_EPORT: &[u8] = b"EPORT";
pub const SKSTACK_EVENT_EVENT: &[u8] = b"EVENT";

// ----------------------------------------------------------------------------
// Fixed token widths (hex digits)
// ----------------------------------------------------------------------------

pub const SKSTACK_WIDTH_UINT8: usize = 2;
pub const SKSTACK_WIDTH_UINT16: usize = 4;
pub const SKSTACK_WIDTH_UINT32: usize = 8;
pub const SKSTACK_WIDTH_UINT64: usize = 16;
pub const SKSTACK_WIDTH_ADDR64: usize = 16;
pub const SKSTACK_WIDTH_IPADDR: usize = 39;

/// Maximum number of digits of a decimal token (fits in u32)
pub const SKSTACK_DECIMAL_MAX_DIGITS: usize = 10;

// ----------------------------------------------------------------------------
// Channel table
// ----------------------------------------------------------------------------

/// First raw channel value (channel 33)
pub const SKSTACK_CHANNEL_FIRST: u8 = 0x21;

/// Last raw channel value (channel 60)
pub const SKSTACK_CHANNEL_LAST: u8 = 0x3C;

/// Number of entries in the channel table
pub const SKSTACK_CHANNEL_COUNT: usize = (SKSTACK_CHANNEL_LAST - SKSTACK_CHANNEL_FIRST) as usize + 1;

/// Centre frequency of the first channel in kHz
pub const SKSTACK_CHANNEL_BASE_FREQUENCY_KHZ: u32 = 922_500;

/// Channel spacing in kHz
pub const SKSTACK_CHANNEL_SPACING_KHZ: u32 = 200;

// ----------------------------------------------------------------------------
// Port table layout (EPORT)
// ----------------------------------------------------------------------------

pub const SKSTACK_UDP_PORT_COUNT: usize = 6;
pub const SKSTACK_TCP_PORT_COUNT: usize = 4;

// ----------------------------------------------------------------------------
// Event numbers (EVENT <NUM>)
// ----------------------------------------------------------------------------

/// UDP send completed; the only event carrying a parameter byte
pub const SKSTACK_EVENT_NUM_UDP_SEND_COMPLETED: u8 = 0x21;

/// Wakeup signal received; the only event without a sender address
pub const SKSTACK_EVENT_NUM_WAKEUP_SIGNAL: u8 = 0xC0;
