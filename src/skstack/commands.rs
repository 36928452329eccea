//! # Command Catalog
//!
//! Command names, builders returning encoded [`Command`]s, parsers for their
//! replies, and typed helpers on [`SkStackClient`] combining the three.
//! Multi-step workflows (active scan, PANA session setup, sleep) are left to
//! callers; they are sequences of these primitives.

use crate::error::{ProtocolError, SkStackError};
use crate::skstack::address::Addr64;
use crate::skstack::channel::Channel;
use crate::skstack::client::SkStackClient;
use crate::skstack::event::{ErxudpDataFormat, Event, NeighborCacheEntry, PortList};
use crate::skstack::response::Response;
use crate::skstack::sequence::parse_complete;
use crate::skstack::syntax::ProtocolSyntax;
use crate::skstack::token::{
    addr64, channel, char_array, ipaddr, literal, token, uint16, TokenErrorKind, TokenResult,
};
use crate::skstack::writer::{Command, CommandLineWriter};
use bytes::Bytes;
use log::info;
use std::net::Ipv6Addr;
use tokio::io::{AsyncRead, AsyncWrite};

pub const SKINFO: &str = "SKINFO";
pub const SKVER: &str = "SKVER";
pub const SKAPPVER: &str = "SKAPPVER";
pub const SKRESET: &str = "SKRESET";
pub const SKSREG: &str = "SKSREG";
pub const SKLL64: &str = "SKLL64";
pub const SKTABLE: &str = "SKTABLE";
pub const SKSENDTO: &str = "SKSENDTO";
pub const SKPING: &str = "SKPING";
pub const SKSCAN: &str = "SKSCAN";
pub const SKSETPWD: &str = "SKSETPWD";
pub const SKSETRBID: &str = "SKSETRBID";
pub const SKTERM: &str = "SKTERM";
pub const ROPT: &str = "ROPT";
pub const WOPT: &str = "WOPT";

/// SKTABLE table selectors
pub const TABLE_ADDRESSES: &[u8] = b"1";
pub const TABLE_NEIGHBORS: &[u8] = b"2";
pub const TABLE_PORTS: &[u8] = b"E";

/// Local interface parameters reported by `SKINFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalInfo {
    pub link_local_address: Ipv6Addr,
    pub addr64: Addr64,
    pub channel: Channel,
    pub pan_id: u16,
    pub addr16: u16,
}

fn simple(name: &str) -> Result<Command, SkStackError> {
    Ok(CommandLineWriter::new(name)?.finish())
}

pub fn info() -> Result<Command, SkStackError> {
    simple(SKINFO)
}

pub fn version() -> Result<Command, SkStackError> {
    simple(SKVER)
}

pub fn app_version() -> Result<Command, SkStackError> {
    simple(SKAPPVER)
}

pub fn reset() -> Result<Command, SkStackError> {
    simple(SKRESET)
}

pub fn terminate() -> Result<Command, SkStackError> {
    simple(SKTERM)
}

/// `SKSREG <reg>` reads a register, `SKSREG <reg> <value>` writes it.
pub fn sreg(register: &str, value: Option<&str>) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKSREG)?;
    writer.token(register.as_bytes())?;
    if let Some(value) = value {
        writer.token(value.as_bytes())?;
    }
    Ok(writer.finish())
}

pub fn ll64(addr: &Addr64) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::with_syntax(SKLL64, ProtocolSyntax::NO_STATUS_LINE)?;
    writer.addr64(addr);
    Ok(writer.finish())
}

pub fn table(selector: &[u8]) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKTABLE)?;
    writer.token(selector)?;
    Ok(writer.finish())
}

/// `SKSENDTO <HANDLE> <IPADDR> <PORT> <SEC> <DATALEN> <DATA>`
pub fn send_to(
    handle: u8,
    dest: &Ipv6Addr,
    port: u16,
    security: bool,
    data: &[u8],
) -> Result<Command, SkStackError> {
    let len = u16::try_from(data.len())
        .map_err(|_| SkStackError::InvalidToken(format!("payload of {} bytes is too long", data.len())))?;
    let mut writer = CommandLineWriter::with_syntax(SKSENDTO, ProtocolSyntax::SPLIT_ECHO)?;
    writer
        .hex(u64::from(handle))
        .ipaddr(dest)
        .uint16(port)
        .binary(security)
        .uint16(len)
        .payload(data);
    Ok(writer.finish())
}

pub fn ping(dest: &Ipv6Addr) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKPING)?;
    writer.ipaddr(dest);
    Ok(writer.finish())
}

/// `SKSCAN <MODE> <CHANNEL_MASK> <DURATION>`
pub fn scan(mode: u8, channel_mask: u32, duration: u8) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKSCAN)?;
    writer
        .hex(u64::from(mode))
        .uint32(channel_mask)
        .hex(u64::from(duration));
    Ok(writer.finish())
}

/// `SKSETPWD <LEN> <PWD>`; the password is masked in logs.
pub fn set_password(password: &[u8]) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKSETPWD)?;
    writer.hex(password.len() as u64).masked_token(password)?;
    Ok(writer.finish())
}

/// `SKSETRBID <ID>`; the route-B ID is masked in logs.
pub fn set_route_b_id(id: &[u8]) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::new(SKSETRBID)?;
    writer.masked_token(id)?;
    Ok(writer.finish())
}

pub fn read_option() -> Result<Command, SkStackError> {
    Ok(CommandLineWriter::with_syntax(ROPT, ProtocolSyntax::SHORT_LINE)?.finish())
}

pub fn write_option(format: ErxudpDataFormat) -> Result<Command, SkStackError> {
    let mut writer = CommandLineWriter::with_syntax(WOPT, ProtocolSyntax::SHORT_LINE)?;
    writer.uint8(format.option_byte());
    Ok(writer.finish())
}

fn line_end(input: &[u8]) -> TokenResult<'_, &[u8]> {
    literal(b"\r\n")(input)
}

fn einfo(input: &[u8]) -> TokenResult<'_, LocalInfo> {
    let (i, _) = literal(b"EINFO ")(input)?;
    let (i, link_local_address) = ipaddr(i)?;
    let (i, addr64) = addr64(i)?;
    let (i, channel) = channel(i)?;
    let (i, pan_id) = uint16(i)?;
    let (i, addr16) = uint16(i)?;
    let (i, _) = line_end(i)?;
    Ok((
        i,
        LocalInfo {
            link_local_address,
            addr64,
            channel,
            pan_id,
            addr16,
        },
    ))
}

fn tagged_text<'a>(tag: &'static [u8]) -> impl Fn(&'a [u8]) -> TokenResult<'a, &'a [u8]> {
    move |input: &'a [u8]| {
        let (i, _) = literal(tag)(input)?;
        char_array(i)
    }
}

fn ipaddr_line(input: &[u8]) -> TokenResult<'_, Ipv6Addr> {
    let (i, addr) = ipaddr(input)?;
    let (i, _) = line_end(i)?;
    Ok((i, addr))
}

/// First data line starting with `prefix`.
fn tagged_line<'r>(response: &'r Response, prefix: &[u8]) -> Result<&'r [u8], SkStackError> {
    response
        .raw_lines()
        .iter()
        .find(|line| line.starts_with(prefix))
        .map(|line| &line[..])
        .ok_or_else(|| {
            SkStackError::Protocol(ProtocolError::new(
                TokenErrorKind::UnexpectedLiteral(String::from_utf8_lossy(prefix).into_owned()),
                response.line(0).unwrap_or_default(),
            ))
        })
}

/// Decode the `EINFO` line of a `SKINFO` response.
pub fn parse_info(response: &Response) -> Result<LocalInfo, SkStackError> {
    let line = tagged_line(response, b"EINFO ")?;
    Ok(parse_complete(line, einfo)?)
}

/// Text following `tag` on the tagged data line (`EVER`, `EAPPVER`).
pub fn parse_tagged_text(response: &Response, tag: &'static [u8]) -> Result<String, SkStackError> {
    let line = tagged_line(response, tag)?;
    let text = parse_complete(line, tagged_text(tag))?;
    Ok(String::from_utf8_lossy(text).into_owned())
}

/// Register value of an `ESREG` line.
pub fn parse_sreg(response: &Response) -> Result<Bytes, SkStackError> {
    let line = tagged_line(response, b"ESREG ")?;
    let value = parse_complete(line, |i| {
        let (i, _) = literal(b"ESREG ")(i)?;
        token(i)
    })?;
    Ok(Bytes::copy_from_slice(value))
}

/// The IPv6 line answering `SKLL64`.
pub fn parse_ll64(response: &Response) -> Result<Ipv6Addr, SkStackError> {
    let line = response.first_line()?;
    Ok(parse_complete(line, ipaddr_line)?)
}

/// The option byte carried in the status text of `ROPT` (`OK 01`).
pub fn parse_option(response: &Response) -> Result<ErxudpDataFormat, SkStackError> {
    let text = response.status_text();
    match hex::decode(text).as_deref() {
        Ok([value]) => Ok(ErxudpDataFormat::from_option_byte(*value)),
        _ => Err(ProtocolError::new(
            TokenErrorKind::WidthMismatch {
                expected: 2,
                actual: text.len(),
            },
            text,
        )
        .into()),
    }
}

fn table_event<T>(response: &Response, pick: impl Fn(&Event) -> Option<T>) -> Result<T, SkStackError> {
    response.events().iter().find_map(pick).ok_or_else(|| {
        SkStackError::Protocol(ProtocolError::new(
            TokenErrorKind::UnexpectedLiteral("table event".into()),
            response.status_text(),
        ))
    })
}

impl<T> SkStackClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn execute(&mut self, command: Command) -> Result<Response, SkStackError> {
        self.send_command(&command).await?.into_result()
    }

    pub async fn sk_info(&mut self) -> Result<LocalInfo, SkStackError> {
        let response = self.execute(info()?).await?;
        parse_info(&response)
    }

    pub async fn sk_ver(&mut self) -> Result<String, SkStackError> {
        let response = self.execute(version()?).await?;
        parse_tagged_text(&response, b"EVER ")
    }

    pub async fn sk_app_ver(&mut self) -> Result<String, SkStackError> {
        let response = self.execute(app_version()?).await?;
        parse_tagged_text(&response, b"EAPPVER ")
    }

    pub async fn sk_reset(&mut self) -> Result<(), SkStackError> {
        self.execute(reset()?).await.map(|_| ())
    }

    pub async fn sk_term(&mut self) -> Result<(), SkStackError> {
        self.execute(terminate()?).await.map(|_| ())
    }

    pub async fn sk_sreg_get(&mut self, register: &str) -> Result<Bytes, SkStackError> {
        let response = self.execute(sreg(register, None)?).await?;
        parse_sreg(&response)
    }

    pub async fn sk_sreg_set(&mut self, register: &str, value: &str) -> Result<(), SkStackError> {
        self.execute(sreg(register, Some(value))?).await.map(|_| ())
    }

    pub async fn sk_ll64(&mut self, addr: &Addr64) -> Result<Ipv6Addr, SkStackError> {
        let response = self.execute(ll64(addr)?).await?;
        parse_ll64(&response)
    }

    pub async fn sk_table_addresses(&mut self) -> Result<Vec<Ipv6Addr>, SkStackError> {
        let response = self.execute(table(TABLE_ADDRESSES)?).await?;
        table_event(&response, |event| match event {
            Event::AddressList(list) => Some(list.clone()),
            _ => None,
        })
    }

    pub async fn sk_table_neighbors(&mut self) -> Result<Vec<NeighborCacheEntry>, SkStackError> {
        let response = self.execute(table(TABLE_NEIGHBORS)?).await?;
        table_event(&response, |event| match event {
            Event::NeighborCache(list) => Some(list.clone()),
            _ => None,
        })
    }

    pub async fn sk_table_ports(&mut self) -> Result<PortList, SkStackError> {
        let response = self.execute(table(TABLE_PORTS)?).await?;
        table_event(&response, |event| match event {
            Event::PortList(ports) => Some(*ports),
            _ => None,
        })
    }

    pub async fn sk_send_to(
        &mut self,
        handle: u8,
        dest: &Ipv6Addr,
        port: u16,
        security: bool,
        data: &[u8],
    ) -> Result<(), SkStackError> {
        self.execute(send_to(handle, dest, port, security, data)?)
            .await
            .map(|_| ())
    }

    pub async fn sk_ping(&mut self, dest: &Ipv6Addr) -> Result<(), SkStackError> {
        self.execute(ping(dest)?).await.map(|_| ())
    }

    pub async fn sk_scan(&mut self, mode: u8, channel_mask: u32, duration: u8) -> Result<(), SkStackError> {
        self.execute(scan(mode, channel_mask, duration)?).await.map(|_| ())
    }

    pub async fn sk_set_pwd(&mut self, password: &[u8]) -> Result<(), SkStackError> {
        self.execute(set_password(password)?).await.map(|_| ())
    }

    pub async fn sk_set_rbid(&mut self, id: &[u8]) -> Result<(), SkStackError> {
        self.execute(set_route_b_id(id)?).await.map(|_| ())
    }

    /// Read the ERXUDP payload format and adopt it for decoding.
    pub async fn ropt(&mut self) -> Result<ErxudpDataFormat, SkStackError> {
        let response = self.execute(read_option()?).await?;
        let format = parse_option(&response)?;
        self.adopt_data_format(format);
        Ok(format)
    }

    /// Select the ERXUDP payload format on the module and adopt it for decoding.
    pub async fn wopt(&mut self, format: ErxudpDataFormat) -> Result<(), SkStackError> {
        self.execute(write_option(format)?).await?;
        self.adopt_data_format(format);
        Ok(())
    }

    fn adopt_data_format(&mut self, format: ErxudpDataFormat) {
        if self.options().erxudp_data_format != format {
            info!("ERXUDP data format is now {format:?}");
            let mut options = self.options().clone();
            options.erxudp_data_format = format;
            self.set_options(options);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        assert_eq!(sreg("S02", None).unwrap().as_bytes(), b"SKSREG S02\r\n");
        assert_eq!(sreg("S02", Some("21")).unwrap().as_bytes(), b"SKSREG S02 21\r\n");
        assert_eq!(table(TABLE_PORTS).unwrap().as_bytes(), b"SKTABLE E\r\n");
        assert_eq!(scan(2, 0xFFFF_FFFF, 6).unwrap().as_bytes(), b"SKSCAN 2 FFFFFFFF 6\r\n");
        assert_eq!(read_option().unwrap().as_bytes(), b"ROPT\r");
        assert_eq!(write_option(ErxudpDataFormat::HexAscii).unwrap().as_bytes(), b"WOPT 01\r");
        assert_eq!(
            ll64(&Addr64::from_u64(0x001D_1290_1234_5678)).unwrap().syntax(),
            &ProtocolSyntax::NO_STATUS_LINE
        );
    }

    #[test]
    fn test_secrets_are_masked() {
        let command = set_password(b"0123456789AB").unwrap();
        assert_eq!(command.as_bytes(), b"SKSETPWD C 0123456789AB\r\n");
        assert_eq!(command.display(), "SKSETPWD C ************");

        let command = set_route_b_id(b"00112233445566778899AABBCCDDEEFF").unwrap();
        assert!(!command.display().contains("0011"));
    }

    #[test]
    fn test_send_to_echo() {
        let dest: Ipv6Addr = "fe80::21d:1290:1234:5678".parse().unwrap();
        let command = send_to(1, &dest, 0x0E1A, true, b"hello").unwrap();
        assert_eq!(
            command.echo(),
            b"SKSENDTO 1 FE80:0000:0000:0000:021D:1290:1234:5678 0E1A 1 0005 "
        );
        assert!(command.as_bytes().ends_with(b"0005 hello"));
        assert!(send_to(1, &dest, 0x0E1A, true, &vec![0u8; 70_000]).is_err());
    }
}
