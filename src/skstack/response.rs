//! # Command Responses
//!
//! A [`Response`] collects everything the module sent for one command between
//! its echoback and its status line: data lines in input order, events that
//! arrived in between, and the status itself.

use crate::error::{ProtocolError, SkStackError};
use crate::skstack::error_code::{map_status_text, DeviceError};
use crate::skstack::event::Event;
use crate::skstack::sequence::parse_complete;
use crate::skstack::token::{TokenErrorKind, TokenResult};
use bytes::Bytes;
use std::fmt;

/// Outcome reported by the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    Fail,
    /// No status line was received (`NoStatusLine` syntax)
    Undetermined,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Ok => f.write_str("OK"),
            ResponseStatus::Fail => f.write_str("FAIL"),
            ResponseStatus::Undetermined => f.write_str("undetermined"),
        }
    }
}

/// A finalised reply to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: ResponseStatus,
    status_text: Bytes,
    /// Data lines including their terminator
    lines: Vec<Bytes>,
    events: Vec<Event>,
}

fn trim_terminator(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|&b| b != b'\r' && b != b'\n')
        .map_or(0, |p| p + 1);
    &line[..end]
}

impl Response {
    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// Text following `OK`/`FAIL` and a single space; empty if there was none.
    pub fn status_text(&self) -> &[u8] {
        &self.status_text
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// Number of data lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Data lines without their terminator, in input order.
    pub fn lines(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.lines.iter().map(|line| trim_terminator(line))
    }

    pub fn line(&self, index: usize) -> Option<&[u8]> {
        self.lines.get(index).map(|line| trim_terminator(line))
    }

    /// Data lines as received, terminator included.
    pub fn raw_lines(&self) -> &[Bytes] {
        &self.lines
    }

    /// Decode data line `index` with a token parser.
    ///
    /// The parser sees the line with its terminator, so streaming token
    /// parsers find the delimiter after the last field.
    pub fn parse_line<'a, T, P>(&'a self, index: usize, parser: P) -> Result<T, SkStackError>
    where
        P: FnMut(&'a [u8]) -> TokenResult<'a, T>,
    {
        let line = self.lines.get(index).ok_or_else(|| {
            SkStackError::Other(format!("response has no data line {index}"))
        })?;
        Ok(parse_complete(line, parser)?)
    }

    /// Events received while this response was being collected, in wire order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Structured error for a `FAIL` response.
    pub fn error(&self) -> Option<DeviceError> {
        match self.status {
            ResponseStatus::Fail => Some(map_status_text(&self.status_text)),
            _ => None,
        }
    }

    /// Turn a `FAIL` response into [`SkStackError::Device`].
    pub fn into_result(self) -> Result<Response, SkStackError> {
        match self.error() {
            Some(err) => Err(err.into()),
            None => Ok(self),
        }
    }

    /// First data line, failing if the response has none.
    pub(crate) fn first_line(&self) -> Result<&Bytes, ProtocolError> {
        self.lines
            .first()
            .ok_or_else(|| ProtocolError::new(TokenErrorKind::Truncated, &[]))
    }
}

/// In-flight response; finalised by [`ResponseBuilder::finish`].
#[derive(Debug, Default)]
pub(crate) struct ResponseBuilder {
    lines: Vec<Bytes>,
    events: Vec<Event>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: Bytes) {
        self.lines.push(line);
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn finish(self, status: ResponseStatus, status_text: Bytes) -> Response {
        Response {
            status,
            status_text,
            lines: self.lines,
            events: self.events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skstack::error_code::ErrorCode;
    use crate::skstack::token::uint16;

    fn response(status: ResponseStatus, text: &'static [u8], lines: &[&'static [u8]]) -> Response {
        let mut builder = ResponseBuilder::new();
        for line in lines {
            builder.push_line(Bytes::from_static(line));
        }
        builder.finish(status, Bytes::from_static(text))
    }

    #[test]
    fn test_lines_are_trimmed() {
        let resp = response(ResponseStatus::Ok, b"", &[b"ESREG 8888\r\n", b"\r\n"]);
        assert_eq!(resp.len(), 2);
        assert_eq!(resp.line(0), Some(&b"ESREG 8888"[..]));
        assert_eq!(resp.line(1), Some(&b""[..]));
        assert_eq!(resp.raw_lines()[0], Bytes::from_static(b"ESREG 8888\r\n"));
        assert!(resp.is_success());
        assert!(resp.error().is_none());
    }

    #[test]
    fn test_parse_line() {
        let resp = response(ResponseStatus::Ok, b"", &[b"8888\r\n"]);
        assert_eq!(resp.parse_line(0, uint16).unwrap(), 0x8888);
        assert!(resp.parse_line(1, uint16).is_err());
    }

    #[test]
    fn test_fail_into_result() {
        let resp = response(ResponseStatus::Fail, b"ER04", &[]);
        assert_eq!(resp.error().map(|e| e.code), Some(ErrorCode::Er04));
        match resp.into_result() {
            Err(SkStackError::Device(err)) => assert_eq!(err.code_text, "ER04"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
