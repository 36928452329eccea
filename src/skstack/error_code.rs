//! # FAIL Status Error Mapping
//!
//! A `FAIL` status line carries a four character error code, optionally
//! followed by a space and free text (`FAIL ER06 invalid argument`). The text
//! is interpreted only after the response has been finalised, so an
//! unparseable tail never interferes with framing.

use crate::constants::SKSTACK_ERROR_CODE_LEN;
use std::fmt;
use thiserror::Error;

/// Error codes reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Er01,
    Er02,
    Er03,
    Er04,
    Er05,
    Er06,
    Er07,
    Er08,
    Er09,
    Er10,
    /// Code not known to this crate; the raw text is kept in [`DeviceError`]
    Undefined,
}

impl ErrorCode {
    pub fn from_code(code: &[u8]) -> Self {
        match code {
            b"ER01" => ErrorCode::Er01,
            b"ER02" => ErrorCode::Er02,
            b"ER03" => ErrorCode::Er03,
            b"ER04" => ErrorCode::Er04,
            b"ER05" => ErrorCode::Er05,
            b"ER06" => ErrorCode::Er06,
            b"ER07" => ErrorCode::Er07,
            b"ER08" => ErrorCode::Er08,
            b"ER09" => ErrorCode::Er09,
            b"ER10" => ErrorCode::Er10,
            _ => ErrorCode::Undefined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Er01 => "ER01",
            ErrorCode::Er02 => "ER02",
            ErrorCode::Er03 => "ER03",
            ErrorCode::Er04 => "ER04",
            ErrorCode::Er05 => "ER05",
            ErrorCode::Er06 => "ER06",
            ErrorCode::Er07 => "ER07",
            ErrorCode::Er08 => "ER08",
            ErrorCode::Er09 => "ER09",
            ErrorCode::Er10 => "ER10",
            ErrorCode::Undefined => "UNDEFINED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::Er01 | ErrorCode::Er02 | ErrorCode::Er03 => "reserved",
            ErrorCode::Er04 => "unsupported command",
            ErrorCode::Er05 => "invalid number of arguments",
            ErrorCode::Er06 => "invalid argument format or value out of range",
            ErrorCode::Er07 | ErrorCode::Er08 => "reserved",
            ErrorCode::Er09 => "UART input error",
            ErrorCode::Er10 => "command accepted but execution failed",
            ErrorCode::Undefined => "undefined error code",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured reason of a `FAIL` status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct DeviceError {
    pub code: ErrorCode,
    /// The code token as received (`ER06`, `ERXX`, ...)
    pub code_text: String,
    /// Free text following the code
    pub text: String,
    /// Complete status text after `FAIL `
    pub status_text: String,
}

impl DeviceError {
    pub fn description(&self) -> &'static str {
        self.code.description()
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code_text, self.code.description())?;
        if !self.text.is_empty() {
            write!(f, ": {}", self.text)?;
        }
        Ok(())
    }
}

/// Map the text following `FAIL` to a [`DeviceError`].
pub fn map_status_text(status_text: &[u8]) -> DeviceError {
    let split = status_text.len().min(SKSTACK_ERROR_CODE_LEN);
    let (code, rest) = status_text.split_at(split);
    let text = rest.strip_prefix(b" ").unwrap_or(rest);

    DeviceError {
        code: ErrorCode::from_code(code),
        code_text: String::from_utf8_lossy(code).into_owned(),
        text: String::from_utf8_lossy(text).into_owned(),
        status_text: String::from_utf8_lossy(status_text).into_owned(),
    }
}
