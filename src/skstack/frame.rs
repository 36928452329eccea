//! # Line Framing and Classification
//!
//! Extracts the next complete line from the unread bytes according to the
//! active [`ProtocolSyntax`] and classifies it as echo, status, event
//! candidate or plain data. Nothing here mutates the buffer; the caller
//! consumes `Line::len` bytes once it has acted on the classification.

use crate::constants::{SKSTACK_STATUS_FAIL, SKSTACK_STATUS_OK};
use crate::skstack::event::EventCode;
use crate::skstack::response::ResponseStatus;
use crate::skstack::syntax::ProtocolSyntax;
use std::ops::Range;

/// Kind of a classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Echo,
    Status {
        status: ResponseStatus,
        /// Byte range of the status text within the buffer
        text: Range<usize>,
    },
    EventCandidate(EventCode),
    Data,
}

/// One classified line at the start of the unread bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    /// Line content without terminator
    pub content: Range<usize>,
    /// Bytes to consume for this line, terminator included
    pub len: usize,
}

/// Locate the first complete line in `buf`.
///
/// Returns the content range and the total length including the terminator,
/// or `None` while the terminator has not been received.
pub fn next_line(buf: &[u8], terminator: &[u8]) -> Option<(Range<usize>, usize)> {
    if terminator.is_empty() {
        return None;
    }

    buf.windows(terminator.len())
        .position(|w| w == terminator)
        .map(|pos| (0..pos, pos + terminator.len()))
}

/// Recognise `OK` / `FAIL` followed by a space or the end of the line.
///
/// Returns the status and the text after the separating space.
pub fn status_line(content: &[u8]) -> Option<(ResponseStatus, &[u8])> {
    let (status, rest) = if let Some(rest) = content.strip_prefix(SKSTACK_STATUS_OK) {
        (ResponseStatus::Ok, rest)
    } else if let Some(rest) = content.strip_prefix(SKSTACK_STATUS_FAIL) {
        (ResponseStatus::Fail, rest)
    } else {
        return None;
    };

    match rest.split_first() {
        None => Some((status, rest)),
        Some((b' ', text)) => Some((status, text)),
        Some(_) => None,
    }
}

fn trim_trailing(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&b| !matches!(b, b' ' | b'\r' | b'\n'))
        .map_or(0, |p| p + 1);
    &data[..end]
}

/// Whether a line repeats the command that was sent.
///
/// Trailing spaces and terminators are ignored on both sides.
pub fn is_echo(content: &[u8], expected_echo: &[u8]) -> bool {
    let expected = trim_trailing(expected_echo);
    !expected.is_empty() && trim_trailing(content) == expected
}

/// Classify the first complete line of `buf`.
pub fn classify(buf: &[u8], syntax: &ProtocolSyntax, expected_echo: Option<&[u8]>) -> Option<Line> {
    let (content, len) = next_line(buf, syntax.line_terminator())?;
    let bytes = &buf[content.clone()];

    let kind = if expected_echo.is_some_and(|echo| is_echo(bytes, echo)) {
        LineKind::Echo
    } else if let Some((status, text)) = status_line(bytes) {
        let text_start = content.end - text.len();
        LineKind::Status {
            status,
            text: text_start..content.end,
        }
    } else if let Some(code) = EventCode::from_line(bytes) {
        LineKind::EventCandidate(code)
    } else {
        LineKind::Data
    };

    Some(Line { kind, content, len })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(buf: &[u8], echo: Option<&[u8]>) -> Option<LineKind> {
        classify(buf, &ProtocolSyntax::DEFAULT, echo).map(|line| line.kind)
    }

    #[test]
    fn test_next_line() {
        assert_eq!(next_line(b"OK\r\nEVE", b"\r\n"), Some((0..2, 4)));
        assert_eq!(next_line(b"OK\r", b"\r\n"), None);
        assert_eq!(next_line(b"", b"\r\n"), None);
        assert_eq!(next_line(b"OK 1\r\nEV", b"\r"), Some((0..4, 5)));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(b"OK"), Some((ResponseStatus::Ok, &b""[..])));
        assert_eq!(status_line(b"OK DONE"), Some((ResponseStatus::Ok, &b"DONE"[..])));
        assert_eq!(status_line(b"FAIL ER10"), Some((ResponseStatus::Fail, &b"ER10"[..])));
        assert_eq!(status_line(b"OKAY"), None);
        assert_eq!(status_line(b"FAILED"), None);
        assert_eq!(status_line(b" OK"), None);
    }

    #[test]
    fn test_classify_status_text_range() {
        let buf = b"OK DONE\r\n";
        let line = classify(buf, &ProtocolSyntax::DEFAULT, None).unwrap();
        match line.kind {
            LineKind::Status { status, text } => {
                assert_eq!(status, ResponseStatus::Ok);
                assert_eq!(&buf[text], b"DONE");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(line.len, 9);
    }

    #[test]
    fn test_classify_kinds() {
        let echo: &[u8] = b"SKINFO\r\n";
        assert_eq!(kind(b"SKINFO\r\nOK\r\n", Some(echo)), Some(LineKind::Echo));
        assert_eq!(kind(b"SKINFO\r\n", None), Some(LineKind::Data));
        assert_eq!(kind(b"EVENT C0\r\n", Some(echo)), Some(LineKind::EventCandidate(EventCode::Event)));
        assert_eq!(kind(b"EINFO FE80\r\n", Some(echo)), Some(LineKind::Data));
        assert_eq!(kind(b"EVENTS 1\r\n", None), Some(LineKind::Data));
        assert_eq!(kind(b"OK", None), None);
    }

    #[test]
    fn test_echo_ignores_trailing_spaces() {
        assert!(is_echo(b"SKSENDTO 1 FE80 0E1A 1 0005", b"SKSENDTO 1 FE80 0E1A 1 0005 "));
        assert!(is_echo(b"WOPT 01 ", b"WOPT 01\r"));
        assert!(!is_echo(b"SKINF", b"SKINFO\r\n"));
        assert!(!is_echo(b"", b""));
    }

    #[test]
    fn test_short_line_syntax() {
        let line = classify(b"OK 01\r", &ProtocolSyntax::SHORT_LINE, None).unwrap();
        assert!(matches!(line.kind, LineKind::Status { status: ResponseStatus::Ok, .. }));
        assert_eq!(line.len, 6);
    }
}
