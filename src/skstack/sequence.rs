//! # Sequence Parser Context
//!
//! Decoders never mutate the receive buffer themselves. They are handed the
//! unread bytes as an immutable slice, parse speculatively and report one of
//! three outcomes:
//!
//! - [`SequenceOutcome::Complete`]: `consumed` bytes form one value;
//! - [`SequenceOutcome::Ignore`]: the bytes belong to someone else, nothing changes;
//! - [`SequenceOutcome::Incomplete`]: more input is needed, nothing changes.
//!
//! [`SequenceContext`] applies the outcome to the [`UnreadBuffer`]: the buffer
//! is advanced only for a complete decode. A decoder can therefore be invoked
//! again and again against growing input and always starts from the same
//! position.

use crate::error::ProtocolError;
use crate::skstack::token::{TokenErrorKind, TokenResult};
use crate::util::iobuffer::UnreadBuffer;

/// Outcome of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome<T> {
    Complete { value: T, consumed: usize },
    Ignore,
    Incomplete,
}

impl<T> SequenceOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SequenceOutcome<U> {
        match self {
            SequenceOutcome::Complete { value, consumed } => SequenceOutcome::Complete {
                value: f(value),
                consumed,
            },
            SequenceOutcome::Ignore => SequenceOutcome::Ignore,
            SequenceOutcome::Incomplete => SequenceOutcome::Incomplete,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SequenceOutcome::Complete { .. })
    }

    /// Decoded value, if complete.
    pub fn value(self) -> Option<T> {
        match self {
            SequenceOutcome::Complete { value, .. } => Some(value),
            _ => None,
        }
    }
}

pub type SequenceResult<T> = Result<SequenceOutcome<T>, ProtocolError>;

/// Runs a streaming token parser against the unread bytes.
pub fn parse_sequence<'a, T, P>(input: &'a [u8], mut parser: P) -> SequenceResult<T>
where
    P: FnMut(&'a [u8]) -> TokenResult<'a, T>,
{
    match parser(input) {
        Ok((rest, value)) => Ok(SequenceOutcome::Complete {
            value,
            consumed: input.len() - rest.len(),
        }),
        Err(nom::Err::Incomplete(_)) => Ok(SequenceOutcome::Incomplete),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.into()),
    }
}

/// Runs a token parser against a line that is known to be complete.
///
/// Running out of input here means a field is missing, which is an error.
pub fn parse_complete<'a, T, P>(input: &'a [u8], mut parser: P) -> Result<T, ProtocolError>
where
    P: FnMut(&'a [u8]) -> TokenResult<'a, T>,
{
    match parser(input) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Incomplete(_)) => Err(ProtocolError::new(TokenErrorKind::Truncated, input)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.into()),
    }
}

/// Commit-or-rollback view over the receive buffer.
pub struct SequenceContext<'b> {
    buffer: &'b mut UnreadBuffer,
}

impl<'b> SequenceContext<'b> {
    pub fn new(buffer: &'b mut UnreadBuffer) -> Self {
        SequenceContext { buffer }
    }

    pub fn unread(&self) -> &[u8] {
        self.buffer.unread()
    }

    /// Runs `decoder` and advances the buffer only when it completed.
    ///
    /// On `Ignore`, `Incomplete` and on errors the buffer is left untouched.
    pub fn decode<T, D>(&mut self, decoder: D) -> SequenceResult<T>
    where
        D: FnOnce(&[u8]) -> SequenceResult<T>,
    {
        let outcome = decoder(self.buffer.unread())?;
        if let SequenceOutcome::Complete { consumed, .. } = &outcome {
            self.buffer.advance(*consumed);
        }
        Ok(outcome)
    }
}
