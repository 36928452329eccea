//! # Protocol Syntax
//!
//! The firmware is not consistent about line endings and status lines across
//! command families. A [`ProtocolSyntax`] captures one such convention as
//! plain data; the correlator is parameterised with it per call instead of
//! special-casing individual commands.

use crate::constants::{SKSTACK_CR, SKSTACK_CRLF, SKSTACK_NO_TERMINATOR};
use std::fmt;

/// Line termination and status expectations of one command family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolSyntax {
    pub name: &'static str,
    /// Appended by the writer after the last command token
    pub end_of_command_line: &'static [u8],
    /// Terminates the echoback line and every data or event line
    pub end_of_echoback_line: &'static [u8],
    /// Terminates the status line
    pub end_of_status_line: &'static [u8],
    /// Whether the reply ends with an `OK`/`FAIL` line
    pub expect_status_line: bool,
}

impl ProtocolSyntax {
    /// CRLF everywhere, reply ends with a status line.
    pub const DEFAULT: ProtocolSyntax = ProtocolSyntax {
        name: "Default",
        end_of_command_line: SKSTACK_CRLF,
        end_of_echoback_line: SKSTACK_CRLF,
        end_of_status_line: SKSTACK_CRLF,
        expect_status_line: true,
    };

    /// Commands such as `SKLL64` that answer with one bare data line.
    pub const NO_STATUS_LINE: ProtocolSyntax = ProtocolSyntax {
        name: "NoStatusLine",
        expect_status_line: false,
        ..ProtocolSyntax::DEFAULT
    };

    /// Commands such as `SKSENDTO` whose binary payload follows the last token
    /// inline; the echo covers the tokens only.
    ///
    /// The module echoes these tokens without the separator that precedes
    /// the payload, so echo matching ignores trailing spaces and terminators
    /// on both sides for every syntax (see [`is_echo`](crate::skstack::frame::is_echo)).
    pub const SPLIT_ECHO: ProtocolSyntax = ProtocolSyntax {
        name: "SplitEcho",
        end_of_command_line: SKSTACK_NO_TERMINATOR,
        ..ProtocolSyntax::DEFAULT
    };

    /// Product configuration commands (`ROPT`, `WOPT`, ...) that use CR only.
    pub const SHORT_LINE: ProtocolSyntax = ProtocolSyntax {
        name: "ShortLine",
        end_of_command_line: SKSTACK_CR,
        end_of_echoback_line: SKSTACK_CR,
        end_of_status_line: SKSTACK_CR,
        expect_status_line: true,
    };

    /// Terminator used for lines whose kind is not known yet.
    ///
    /// All predefined syntaxes use the same terminator for echo, data and
    /// status lines.
    pub fn line_terminator(&self) -> &'static [u8] {
        self.end_of_echoback_line
    }
}

impl Default for ProtocolSyntax {
    fn default() -> Self {
        ProtocolSyntax::DEFAULT
    }
}

impl fmt::Display for ProtocolSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants() {
        assert!(ProtocolSyntax::DEFAULT.expect_status_line);
        assert!(!ProtocolSyntax::NO_STATUS_LINE.expect_status_line);
        assert_eq!(ProtocolSyntax::NO_STATUS_LINE.end_of_command_line, b"\r\n");
        assert!(ProtocolSyntax::SPLIT_ECHO.end_of_command_line.is_empty());
        assert_eq!(ProtocolSyntax::SPLIT_ECHO.line_terminator(), b"\r\n");
        assert_eq!(ProtocolSyntax::SHORT_LINE.line_terminator(), b"\r");
        assert_eq!(ProtocolSyntax::default(), ProtocolSyntax::DEFAULT);
        assert_eq!(ProtocolSyntax::SHORT_LINE.to_string(), "ShortLine");
    }
}
