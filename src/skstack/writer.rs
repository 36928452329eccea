//! # Command Line Writer
//!
//! Encodes outbound command lines `<COMMAND>[ <TOKEN>]*<EOL>`. Tokens are
//! validated (non-empty, no space, no CR/LF) and numeric values are written
//! as fixed-width uppercase hex, the encoders mirroring the token decoders.
//!
//! Besides the wire bytes every command keeps a display form for logging in
//! which masked tokens are replaced by asterisks. The wire bytes of a command
//! are zeroized on drop because they may carry passwords.
//!
//! ```rust
//! use skstack_rs::skstack::writer::CommandLineWriter;
//!
//! let mut writer = CommandLineWriter::new("SKSREG").unwrap();
//! writer.token(b"S02").unwrap().uint8(0x21);
//! let command = writer.finish();
//! assert_eq!(command.as_bytes(), b"SKSREG S02 21\r\n");
//! ```

use crate::error::SkStackError;
use crate::skstack::address::Addr64;
use crate::skstack::channel::Channel;
use crate::skstack::syntax::ProtocolSyntax;
use std::fmt;
use std::net::Ipv6Addr;
use zeroize::Zeroizing;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// An encoded command line ready to be written to the transport.
#[derive(Clone)]
pub struct Command {
    line: Zeroizing<Vec<u8>>,
    echo_len: usize,
    syntax: ProtocolSyntax,
    display: String,
}

impl Command {
    /// Complete wire bytes, terminator and inline payload included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.line
    }

    /// The part of the line the module repeats as echoback.
    pub fn echo(&self) -> &[u8] {
        &self.line[..self.echo_len]
    }

    pub fn syntax(&self) -> &ProtocolSyntax {
        &self.syntax
    }

    /// Log-safe rendering with masked tokens hidden.
    pub fn display(&self) -> &str {
        &self.display
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("line", &self.display)
            .field("syntax", &self.syntax.name)
            .finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

fn validate_token(token: &[u8]) -> Result<(), SkStackError> {
    if token.is_empty() {
        return Err(SkStackError::InvalidToken("empty token".into()));
    }
    if let Some(&b) = token.iter().find(|&&b| matches!(b, b' ' | b'\r' | b'\n')) {
        return Err(SkStackError::InvalidToken(format!(
            "token {:?} contains 0x{b:02X}",
            String::from_utf8_lossy(token)
        )));
    }
    Ok(())
}

/// Builder for one command line.
pub struct CommandLineWriter {
    line: Zeroizing<Vec<u8>>,
    display: String,
    syntax: ProtocolSyntax,
    echo_len: Option<usize>,
}

impl CommandLineWriter {
    pub fn new(command: &str) -> Result<Self, SkStackError> {
        Self::with_syntax(command, ProtocolSyntax::DEFAULT)
    }

    pub fn with_syntax(command: &str, syntax: ProtocolSyntax) -> Result<Self, SkStackError> {
        validate_token(command.as_bytes())?;
        let mut line = Zeroizing::new(Vec::with_capacity(64));
        line.extend_from_slice(command.as_bytes());
        Ok(CommandLineWriter {
            line,
            display: command.to_string(),
            syntax,
            echo_len: None,
        })
    }

    fn separator(&mut self) {
        self.line.push(b' ');
        self.display.push(' ');
    }

    fn put_hex(&mut self, value: u64, width: usize) -> &mut Self {
        self.separator();
        let start = self.line.len();
        for shift in (0..width).rev() {
            let nibble = (value >> (shift * 4)) & 0x0F;
            self.line.push(HEX_DIGITS[nibble as usize]);
        }
        self.display
            .push_str(&String::from_utf8_lossy(&self.line[start..]));
        self
    }

    /// Arbitrary text token.
    pub fn token(&mut self, token: &[u8]) -> Result<&mut Self, SkStackError> {
        validate_token(token)?;
        self.separator();
        self.line.extend_from_slice(token);
        self.display.push_str(&String::from_utf8_lossy(token));
        Ok(self)
    }

    /// Token that is sent as-is but shown as asterisks in logs.
    pub fn masked_token(&mut self, token: &[u8]) -> Result<&mut Self, SkStackError> {
        validate_token(token)?;
        self.separator();
        self.line.extend_from_slice(token);
        self.display.push_str(&"*".repeat(token.len()));
        Ok(self)
    }

    pub fn uint8(&mut self, value: u8) -> &mut Self {
        self.put_hex(u64::from(value), 2)
    }

    pub fn uint16(&mut self, value: u16) -> &mut Self {
        self.put_hex(u64::from(value), 4)
    }

    pub fn uint32(&mut self, value: u32) -> &mut Self {
        self.put_hex(u64::from(value), 8)
    }

    pub fn uint64(&mut self, value: u64) -> &mut Self {
        self.put_hex(value, 16)
    }

    /// Hex value without zero padding (`SKSCAN` duration, register values).
    pub fn hex(&mut self, value: u64) -> &mut Self {
        let digits = ((64 - value.leading_zeros() as usize) + 3) / 4;
        self.put_hex(value, digits.max(1))
    }

    /// Single digit flag.
    pub fn binary(&mut self, value: bool) -> &mut Self {
        self.put_hex(u64::from(value), 1)
    }

    pub fn decimal(&mut self, value: u32) -> &mut Self {
        self.separator();
        let text = value.to_string();
        self.line.extend_from_slice(text.as_bytes());
        self.display.push_str(&text);
        self
    }

    /// Fully expanded IPv6 address, 8 groups of 4 uppercase hex digits.
    pub fn ipaddr(&mut self, addr: &Ipv6Addr) -> &mut Self {
        self.separator();
        let start = self.line.len();
        for (i, segment) in addr.segments().iter().enumerate() {
            if i > 0 {
                self.line.push(b':');
            }
            for shift in (0..4).rev() {
                self.line.push(HEX_DIGITS[usize::from((segment >> (shift * 4)) & 0x0F)]);
            }
        }
        self.display
            .push_str(&String::from_utf8_lossy(&self.line[start..]));
        self
    }

    pub fn addr64(&mut self, addr: &Addr64) -> &mut Self {
        self.put_hex(addr.to_u64(), 16)
    }

    pub fn channel(&mut self, channel: Channel) -> &mut Self {
        self.uint8(channel.raw())
    }

    /// Raw payload following the last token (`SKSENDTO`).
    ///
    /// The echoback covers the line up to here; the payload itself is not
    /// validated and may contain any byte.
    pub fn payload(&mut self, data: &[u8]) -> &mut Self {
        self.separator();
        self.echo_len = Some(self.line.len());
        self.line.extend_from_slice(data);
        self.display.push_str(&format!("<{} bytes>", data.len()));
        self
    }

    /// Append the command terminator and return the finished command.
    pub fn finish(mut self) -> Command {
        self.line
            .extend_from_slice(self.syntax.end_of_command_line);
        let echo_len = self.echo_len.unwrap_or(self.line.len());
        Command {
            line: self.line,
            echo_len,
            syntax: self.syntax,
            display: self.display,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skstack::token;

    #[test]
    fn test_basic_command() {
        let command = CommandLineWriter::new("SKINFO").unwrap().finish();
        assert_eq!(command.as_bytes(), b"SKINFO\r\n");
        assert_eq!(command.echo(), b"SKINFO\r\n");
        assert_eq!(command.display(), "SKINFO");
    }

    #[test]
    fn test_numeric_tokens() {
        let mut writer = CommandLineWriter::new("TEST").unwrap();
        writer
            .uint8(0x0A)
            .uint16(0x0E1A)
            .uint32(0xFFFF_FFFF)
            .hex(6)
            .hex(0)
            .binary(true)
            .decimal(3610);
        let command = writer.finish();
        assert_eq!(command.as_bytes(), b"TEST 0A 0E1A FFFFFFFF 6 0 1 3610\r\n");
    }

    #[test]
    fn test_addresses_round_trip() {
        let ip: Ipv6Addr = "fe80::21d:1290:1234:5678".parse().unwrap();
        let mut writer = CommandLineWriter::new("SKPING").unwrap();
        writer.ipaddr(&ip).addr64(&Addr64::from_u64(0x001D_1290_1234_5678));
        let command = writer.finish();
        assert_eq!(
            command.as_bytes(),
            b"SKPING FE80:0000:0000:0000:021D:1290:1234:5678 001D129012345678\r\n"
        );

        let (rest, decoded) = token::ipaddr(&command.as_bytes()[7..]).unwrap();
        assert_eq!(decoded, ip);
        assert_eq!(token::addr64(rest).unwrap().1.to_u64(), 0x001D_1290_1234_5678);
    }

    #[test]
    fn test_invalid_tokens() {
        assert!(CommandLineWriter::new("").is_err());
        assert!(CommandLineWriter::new("SK INFO").is_err());
        let mut writer = CommandLineWriter::new("SKSETPWD").unwrap();
        assert!(matches!(writer.token(b"A B"), Err(SkStackError::InvalidToken(_))));
        assert!(writer.token(b"AB\r\n").is_err());
        assert!(writer.token(b"").is_err());
    }

    #[test]
    fn test_masked_token() {
        let mut writer = CommandLineWriter::new("SKSETPWD").unwrap();
        writer.hex(0xC);
        writer.masked_token(b"secret").unwrap();
        let command = writer.finish();
        assert_eq!(command.as_bytes(), b"SKSETPWD C secret\r\n");
        assert_eq!(command.display(), "SKSETPWD C ******");
        assert!(!format!("{command:?}").contains("secret"));
    }

    #[test]
    fn test_split_echo_payload() {
        let mut writer = CommandLineWriter::with_syntax("SKSENDTO", ProtocolSyntax::SPLIT_ECHO).unwrap();
        writer.uint8(1).uint16(0x0E1A).binary(true).uint16(3).payload(b"\r\n\x00");
        let command = writer.finish();
        assert_eq!(command.as_bytes(), b"SKSENDTO 01 0E1A 1 0003 \r\n\x00");
        assert_eq!(command.echo(), b"SKSENDTO 01 0E1A 1 0003 ");
        assert_eq!(command.display(), "SKSENDTO 01 0E1A 1 0003 <3 bytes>");
    }

    #[test]
    fn test_short_line_terminator() {
        let mut writer = CommandLineWriter::with_syntax("WOPT", ProtocolSyntax::SHORT_LINE).unwrap();
        writer.uint8(1);
        assert_eq!(writer.finish().as_bytes(), b"WOPT 01\r");
    }
}
