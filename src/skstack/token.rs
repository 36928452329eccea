//! # SKSTACK Token Decoders
//!
//! Streaming `nom` parsers for the text tokens found in SKSTACK reply and event
//! lines. Every parser follows the same contract:
//!
//! - `Ok((rest, value))` - the token and its single-space separator were consumed.
//!   A CR/LF following the token is left in place for the line-level parser.
//! - `Err(nom::Err::Incomplete(_))` - not enough bytes are buffered yet; nothing
//!   was consumed and the same call can be repeated once more input arrived.
//! - `Err(nom::Err::Error(_))` - the bytes present are malformed (wrong width,
//!   non-hex digit, out-of-range value). Retrying will not help.
//!
//! Fixed-width tokens are bounded by their declared width: the parser reports
//! `Incomplete` until the delimiter following the last digit is visible, and a
//! token visibly longer or shorter than its width is a `WidthMismatch`.
//!
//! ## Usage
//!
//! ```rust
//! use skstack_rs::skstack::token::{addr64, uint16};
//!
//! let (rest, pan_id) = uint16(b"8888 FFFE\r\n").unwrap();
//! assert_eq!(pan_id, 0x8888);
//! assert_eq!(rest, b"FFFE\r\n");
//!
//! // Partial input is reported as incomplete, not as an error
//! assert!(matches!(addr64(b"001D12"), Err(nom::Err::Incomplete(_))));
//! ```

use crate::constants::{
    SKSTACK_DECIMAL_MAX_DIGITS, SKSTACK_WIDTH_ADDR64, SKSTACK_WIDTH_IPADDR, SKSTACK_WIDTH_UINT16,
    SKSTACK_WIDTH_UINT32, SKSTACK_WIDTH_UINT64, SKSTACK_WIDTH_UINT8,
};
use crate::skstack::address::Addr64;
use crate::skstack::channel::Channel;
use nom::error::{ErrorKind, ParseError};
use nom::{Err, IResult, Needed};
use std::net::Ipv6Addr;
use thiserror::Error;

/// Result type of every token parser.
pub type TokenResult<'a, T> = IResult<&'a [u8], T, TokenError<'a>>;

/// Decode failure pointing at the offending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenError<'a> {
    pub input: &'a [u8],
    pub kind: TokenErrorKind,
}

impl<'a> TokenError<'a> {
    pub fn new(input: &'a [u8], kind: TokenErrorKind) -> Self {
        TokenError { input, kind }
    }
}

impl<'a> ParseError<&'a [u8]> for TokenError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        TokenError::new(input, TokenErrorKind::Nom(kind))
    }

    fn append(_input: &'a [u8], _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenErrorKind {
    #[error("expected {expected} characters, found {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("invalid hex digit 0x{0:02X}")]
    InvalidHexDigit(u8),

    #[error("invalid decimal number")]
    InvalidDecimal,

    #[error("value out of range")]
    OutOfRange,

    #[error("channel 0x{0:02X} is not in the channel table")]
    UnknownChannel(u8),

    #[error("expected {0:?}")]
    UnexpectedLiteral(String),

    #[error("empty token")]
    EmptyToken,

    #[error("expected {expected} entries, found {actual}")]
    ItemCount { expected: usize, actual: usize },

    #[error("line ended before all fields were read")]
    Truncated,

    #[error("parse error: {0:?}")]
    Nom(ErrorKind),
}

fn fail<'a, T>(input: &'a [u8], kind: TokenErrorKind) -> TokenResult<'a, T> {
    Err(Err::Error(TokenError::new(input, kind)))
}

#[inline]
fn is_delimiter(b: u8) -> bool {
    b == b' ' || b == b'\r' || b == b'\n'
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}

fn token_len(input: &[u8]) -> usize {
    input
        .iter()
        .position(|&b| is_delimiter(b))
        .unwrap_or(input.len())
}

/// Skips the single space separating two tokens; CR/LF stays.
fn skip_separator(input: &[u8]) -> &[u8] {
    match input.first() {
        Some(b' ') => &input[1..],
        _ => input,
    }
}

/// Folds already validated hex digits into a value.
fn fold_hex(digits: &[u8]) -> u64 {
    digits
        .iter()
        .fold(0u64, |acc, &b| (acc << 4) | u64::from(hex_value(b).unwrap_or(0)))
}

/// Reads a token of exactly `width` characters, checking each one with `check`.
fn fixed_token<'a>(
    input: &'a [u8],
    width: usize,
    check: impl Fn(usize, u8) -> Option<TokenErrorKind>,
) -> TokenResult<'a, &'a [u8]> {
    for (i, &b) in input.iter().enumerate() {
        if is_delimiter(b) {
            if i != width {
                return fail(input, TokenErrorKind::WidthMismatch { expected: width, actual: i });
            }
            return Ok((skip_separator(&input[i..]), &input[..i]));
        }
        if i == width {
            return fail(
                input,
                TokenErrorKind::WidthMismatch {
                    expected: width,
                    actual: token_len(input),
                },
            );
        }
        if let Some(kind) = check(i, b) {
            return fail(input, kind);
        }
    }

    Err(Err::Incomplete(Needed::new(width + 1 - input.len())))
}

fn hex_digit_check(_: usize, b: u8) -> Option<TokenErrorKind> {
    hex_value(b).is_none().then_some(TokenErrorKind::InvalidHexDigit(b))
}

fn fixed_hex(input: &[u8], width: usize) -> TokenResult<'_, u64> {
    let (rest, digits) = fixed_token(input, width, hex_digit_check)?;
    Ok((rest, fold_hex(digits)))
}

/// `UINT8`: 2 hex digits.
pub fn uint8(input: &[u8]) -> TokenResult<'_, u8> {
    let (rest, value) = fixed_hex(input, SKSTACK_WIDTH_UINT8)?;
    Ok((rest, value as u8))
}

/// `UINT16`: 4 hex digits.
pub fn uint16(input: &[u8]) -> TokenResult<'_, u16> {
    let (rest, value) = fixed_hex(input, SKSTACK_WIDTH_UINT16)?;
    Ok((rest, value as u16))
}

/// `UINT32`: 8 hex digits.
pub fn uint32(input: &[u8]) -> TokenResult<'_, u32> {
    let (rest, value) = fixed_hex(input, SKSTACK_WIDTH_UINT32)?;
    Ok((rest, value as u32))
}

/// `UINT64`: 16 hex digits.
pub fn uint64(input: &[u8]) -> TokenResult<'_, u64> {
    fixed_hex(input, SKSTACK_WIDTH_UINT64)
}

/// Single hex digit flag, `0` or `1`.
pub fn binary(input: &[u8]) -> TokenResult<'_, bool> {
    let (rest, value) = fixed_hex(input, 1)?;
    match value {
        0 => Ok((rest, false)),
        1 => Ok((rest, true)),
        _ => fail(input, TokenErrorKind::OutOfRange),
    }
}

/// Unsigned ASCII decimal number of at most 10 digits that fits in 32 bits.
pub fn decimal_number(input: &[u8]) -> TokenResult<'_, u32> {
    let end = token_len(input);
    let digits = &input[..end];

    if !digits.iter().all(u8::is_ascii_digit) {
        return fail(input, TokenErrorKind::InvalidDecimal);
    }
    if digits.len() > SKSTACK_DECIMAL_MAX_DIGITS {
        return fail(input, TokenErrorKind::OutOfRange);
    }
    if end == input.len() {
        return Err(Err::Incomplete(Needed::Unknown));
    }
    if digits.is_empty() {
        return fail(input, TokenErrorKind::EmptyToken);
    }

    let value = digits
        .iter()
        .fold(0u64, |acc, &b| acc * 10 + u64::from(b - b'0'));
    match u32::try_from(value) {
        Ok(value) => Ok((skip_separator(&input[end..]), value)),
        Err(_) => fail(input, TokenErrorKind::OutOfRange),
    }
}

/// `IPADDR`: fully expanded IPv6 address, 8 groups of 4 hex digits.
pub fn ipaddr(input: &[u8]) -> TokenResult<'_, Ipv6Addr> {
    let (rest, text) = fixed_token(input, SKSTACK_WIDTH_IPADDR, |i, b| {
        if i % 5 == 4 {
            (b != b':').then(|| TokenErrorKind::UnexpectedLiteral(":".into()))
        } else {
            hex_digit_check(i, b)
        }
    })?;

    let mut segments = [0u16; 8];
    for (segment, group) in segments.iter_mut().zip(text.split(|&b| b == b':')) {
        *segment = fold_hex(group) as u16;
    }
    Ok((rest, Ipv6Addr::from(segments)))
}

/// `ADDR64`: 16 hex digits.
pub fn addr64(input: &[u8]) -> TokenResult<'_, Addr64> {
    let (rest, value) = fixed_hex(input, SKSTACK_WIDTH_ADDR64)?;
    Ok((rest, Addr64::from_u64(value)))
}

/// `CHANNEL`: one hex byte looked up in the channel table.
pub fn channel(input: &[u8]) -> TokenResult<'_, Channel> {
    let (rest, raw) = uint8(input)?;
    match Channel::from_raw(raw) {
        Some(channel) => Ok((rest, channel)),
        None => fail(input, TokenErrorKind::UnknownChannel(raw)),
    }
}

/// Any non-empty token up to the next space or line end.
pub fn token(input: &[u8]) -> TokenResult<'_, &[u8]> {
    let end = token_len(input);
    if end == input.len() {
        return Err(Err::Incomplete(Needed::Unknown));
    }
    if end == 0 {
        return fail(input, TokenErrorKind::EmptyToken);
    }
    Ok((skip_separator(&input[end..]), &input[..end]))
}

/// Variable-width character array running to the end of the line.
///
/// The line terminator is not consumed.
pub fn char_array(input: &[u8]) -> TokenResult<'_, &[u8]> {
    match input.iter().position(|&b| b == b'\r' || b == b'\n') {
        Some(end) => Ok((&input[end..], &input[..end])),
        None => Err(Err::Incomplete(Needed::Unknown)),
    }
}

/// Matches a fixed literal such as an event code, a label or a terminator.
pub fn literal<'a>(expected: &'static [u8]) -> impl Fn(&'a [u8]) -> TokenResult<'a, &'a [u8]> {
    move |input: &'a [u8]| {
        let n = expected.len().min(input.len());
        if input[..n] != expected[..n] {
            return fail(
                input,
                TokenErrorKind::UnexpectedLiteral(String::from_utf8_lossy(expected).into_owned()),
            );
        }
        if n < expected.len() {
            return Err(Err::Incomplete(Needed::new(expected.len() - n)));
        }
        Ok((&input[n..], &input[..n]))
    }
}

/// Skips any run of spaces.
pub fn spaces(input: &[u8]) -> &[u8] {
    let n = input.iter().take_while(|&&b| b == b' ').count();
    &input[n..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_kind<T: std::fmt::Debug>(result: TokenResult<'_, T>) -> TokenErrorKind {
        match result {
            Err(Err::Error(e)) => e.kind,
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_fixed_width_success() {
        assert_eq!(uint8(b"FF ").unwrap(), (&b""[..], 0xFF));
        assert_eq!(uint8(b"0a\r\n").unwrap(), (&b"\r\n"[..], 0x0A));
        assert_eq!(uint16(b"0E1A 0E1A").unwrap(), (&b"0E1A"[..], 0x0E1A));
        assert_eq!(uint32(b"DEADBEEF\r").unwrap().1, 0xDEAD_BEEF);
        assert_eq!(uint64(b"FFFFFFFFFFFFFFFF ").unwrap().1, u64::MAX);
    }

    #[test]
    fn test_fixed_width_incomplete() {
        assert!(matches!(uint8(b""), Err(Err::Incomplete(_))));
        assert!(matches!(uint8(b"F"), Err(Err::Incomplete(_))));
        // All digits present but the delimiter is not yet visible
        assert!(matches!(uint16(b"8888"), Err(Err::Incomplete(_))));
    }

    #[test]
    fn test_fixed_width_mismatch() {
        assert_eq!(
            error_kind(uint16(b"888 ")),
            TokenErrorKind::WidthMismatch { expected: 4, actual: 3 }
        );
        assert_eq!(
            error_kind(uint8(b"123 ")),
            TokenErrorKind::WidthMismatch { expected: 2, actual: 3 }
        );
        // Too long is detected before the delimiter arrives
        assert!(matches!(
            error_kind(uint8(b"123")),
            TokenErrorKind::WidthMismatch { expected: 2, .. }
        ));
    }

    #[test]
    fn test_invalid_hex() {
        assert_eq!(error_kind(uint8(b"G0 ")), TokenErrorKind::InvalidHexDigit(b'G'));
        assert_eq!(error_kind(uint16(b"12x")), TokenErrorKind::InvalidHexDigit(b'x'));
    }

    #[test]
    fn test_binary() {
        assert!(binary(b"1 ").unwrap().1);
        assert!(!binary(b"0\r\n").unwrap().1);
        assert_eq!(error_kind(binary(b"2 ")), TokenErrorKind::OutOfRange);
    }

    #[test]
    fn test_decimal_number() {
        assert_eq!(decimal_number(b"3610\r\n").unwrap(), (&b"\r\n"[..], 3610));
        assert_eq!(decimal_number(b"4294967295 ").unwrap().1, u32::MAX);
        assert_eq!(error_kind(decimal_number(b"4294967296 ")), TokenErrorKind::OutOfRange);
        assert_eq!(error_kind(decimal_number(b"12345678901")), TokenErrorKind::OutOfRange);
        assert_eq!(error_kind(decimal_number(b"-1 ")), TokenErrorKind::InvalidDecimal);
        assert_eq!(error_kind(decimal_number(b"\r\n")), TokenErrorKind::EmptyToken);
        assert!(matches!(decimal_number(b"36"), Err(Err::Incomplete(_))));
    }

    #[test]
    fn test_ipaddr() {
        let (rest, addr) = ipaddr(b"FE80:0000:0000:0000:021D:1290:1234:5678 X").unwrap();
        assert_eq!(rest, b"X");
        assert_eq!(addr, "fe80::21d:1290:1234:5678".parse::<Ipv6Addr>().unwrap());

        assert!(matches!(ipaddr(b"FE80:0000:0000"), Err(Err::Incomplete(_))));
        // Compressed notation is not accepted
        assert!(ipaddr(b"FE80::21D:1290:1234:5678\r\n").is_err());
    }

    #[test]
    fn test_addr64_and_channel() {
        let (_, addr) = addr64(b"001D129012345678 ").unwrap();
        assert_eq!(addr.to_u64(), 0x001D_1290_1234_5678);

        let (_, ch) = channel(b"21 ").unwrap();
        assert_eq!(ch.number(), 33);
        assert_eq!(error_kind(channel(b"20 ")), TokenErrorKind::UnknownChannel(0x20));
    }

    #[test]
    fn test_literal_and_char_array() {
        let tag = literal(b"EPONG ");
        assert_eq!(tag(b"EPONG FE80").unwrap().0, b"FE80");
        assert!(matches!(tag(b"EPO"), Err(Err::Incomplete(_))));
        assert!(tag(b"EVENT ").is_err());

        assert_eq!(char_array(b"EVER 1.2.10\r\n").unwrap(), (&b"\r\n"[..], &b"EVER 1.2.10"[..]));
        assert!(matches!(char_array(b"EVER 1.2"), Err(Err::Incomplete(_))));
    }
}
