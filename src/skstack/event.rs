//! # Event Decoders
//!
//! Unsolicited notifications share the stream with command replies. Each
//! event code has a decoder built from the streaming token parsers; decoders
//! look at the unread bytes starting at the event line and report a
//! [`SequenceOutcome`]:
//!
//! - `Complete` with the number of bytes making up exactly one event,
//! - `Incomplete` while a multi-line payload is still arriving,
//! - `Ignore` (list events only) when the header line is not the event at all.
//!
//! Decoders are pure functions of their input, so the correlator can retry
//! them from the same position as more bytes arrive.
//!
//! ## Event grammar
//!
//! ```text
//! ERXUDP <SENDER> <DEST> <RPORT> <LPORT> <SENDERLLA> <SECURED> <DATALEN> <DATA>
//! EPONG <SENDER>
//! EADDR / ENEIGHBOR / EPORT   header line, one entry per line, then the status line
//! EPANDESC                    header line, five or six labeled sub-lines
//! EEDSCAN                     header line, one line of channel/LQI pairs
//! EVENT <NUM> [<SENDER> [<PARAM>]]
//! ```

use crate::constants::{
    SKSTACK_CHANNEL_COUNT, SKSTACK_CRLF, SKSTACK_EVENT_EADDR, SKSTACK_EVENT_EEDSCAN,
    SKSTACK_EVENT_ENEIGHBOR, SKSTACK_EVENT_EPANDESC, SKSTACK_EVENT_EPONG, SKSTACK_EVENT_EPORT,
    SKSTACK_EVENT_ERXUDP, SKSTACK_EVENT_EVENT, SKSTACK_EVENT_NUM_UDP_SEND_COMPLETED,
    SKSTACK_EVENT_NUM_WAKEUP_SIGNAL, SKSTACK_TCP_PORT_COUNT, SKSTACK_UDP_PORT_COUNT,
};
use crate::error::ProtocolError;
use crate::skstack::address::Addr64;
use crate::skstack::channel::Channel;
use crate::skstack::frame::{next_line, status_line};
use crate::skstack::sequence::{parse_complete, parse_sequence, SequenceOutcome, SequenceResult};
use crate::skstack::token::{
    addr64, binary, channel, decimal_number, ipaddr, literal, uint16, uint32, uint8, TokenError,
    TokenErrorKind, TokenResult,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;

/// Event codes that start an event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCode {
    Erxudp,
    Epong,
    Eaddr,
    Eneighbor,
    Epandesc,
    Eedscan,
    Eport,
    Event,
}

impl EventCode {
    pub const ALL: [EventCode; 8] = [
        EventCode::Erxudp,
        EventCode::Epong,
        EventCode::Eaddr,
        EventCode::Eneighbor,
        EventCode::Epandesc,
        EventCode::Eedscan,
        EventCode::Eport,
        EventCode::Event,
    ];

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            EventCode::Erxudp => SKSTACK_EVENT_ERXUDP,
            EventCode::Epong => SKSTACK_EVENT_EPONG,
            EventCode::Eaddr => SKSTACK_EVENT_EADDR,
            EventCode::Eneighbor => SKSTACK_EVENT_ENEIGHBOR,
            EventCode::Epandesc => SKSTACK_EVENT_EPANDESC,
            EventCode::Eedscan => SKSTACK_EVENT_EEDSCAN,
            EventCode::Eport => SKSTACK_EVENT_EPORT,
            EventCode::Event => SKSTACK_EVENT_EVENT,
        }
    }

    pub fn from_token(token: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_bytes() == token)
    }

    /// Event code of a line whose first token is one.
    pub fn from_line(line: &[u8]) -> Option<Self> {
        let end = line.iter().position(|&b| b == b' ').unwrap_or(line.len());
        Self::from_token(&line[..end])
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

/// How ERXUDP carries its payload; selected on the module with `WOPT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErxudpDataFormat {
    /// DATALEN raw bytes
    #[default]
    Binary,
    /// 2 x DATALEN hex digits
    HexAscii,
}

impl ErxudpDataFormat {
    /// Decode the `ROPT`/`WOPT` option byte; bit 0 selects hex output.
    pub fn from_option_byte(value: u8) -> Self {
        if value & 0x01 != 0 {
            ErxudpDataFormat::HexAscii
        } else {
            ErxudpDataFormat::Binary
        }
    }

    pub fn option_byte(&self) -> u8 {
        match self {
            ErxudpDataFormat::Binary => 0x00,
            ErxudpDataFormat::HexAscii => 0x01,
        }
    }
}

/// Settings that change how events are decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub erxudp_data_format: ErxudpDataFormat,
    /// EPANDESC carries a `PairID` sub-line
    pub expect_pairing_id: bool,
}

/// Datagram reported by ERXUDP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram {
    pub sender: Ipv6Addr,
    pub dest: Ipv6Addr,
    pub rport: u16,
    pub lport: u16,
    pub sender_lla: Addr64,
    pub secured: bool,
    pub data: Bytes,
}

/// One ENEIGHBOR entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborCacheEntry {
    pub ip_address: Ipv6Addr,
    pub addr64: Addr64,
    pub addr16: u16,
}

/// Open ports reported by EPORT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortList {
    pub udp: [u16; SKSTACK_UDP_PORT_COUNT],
    pub tcp: [u16; SKSTACK_TCP_PORT_COUNT],
}

/// PAN found by an active scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanDescription {
    pub channel: Channel,
    pub channel_page: u8,
    pub pan_id: u16,
    pub addr: Addr64,
    pub lqi: u8,
    pub pairing_id: Option<u32>,
}

/// Measured energy on one channel (EEDSCAN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnergyDetection {
    pub channel: Channel,
    pub lqi: u8,
}

/// Number carried by an `EVENT` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventNumber(pub u8);

impl EventNumber {
    pub const NS_RECEIVED: EventNumber = EventNumber(0x01);
    pub const NA_RECEIVED: EventNumber = EventNumber(0x02);
    pub const ECHO_REQUEST_RECEIVED: EventNumber = EventNumber(0x05);
    pub const ED_SCAN_COMPLETED: EventNumber = EventNumber(0x1F);
    pub const BEACON_RECEIVED: EventNumber = EventNumber(0x20);
    pub const UDP_SEND_COMPLETED: EventNumber = EventNumber(SKSTACK_EVENT_NUM_UDP_SEND_COMPLETED);
    pub const ACTIVE_SCAN_COMPLETED: EventNumber = EventNumber(0x22);
    pub const PANA_CONNECT_FAILED: EventNumber = EventNumber(0x24);
    pub const PANA_CONNECT_COMPLETED: EventNumber = EventNumber(0x25);
    pub const SESSION_TERMINATION_REQUESTED: EventNumber = EventNumber(0x26);
    pub const SESSION_TERMINATED: EventNumber = EventNumber(0x27);
    pub const SESSION_TERMINATION_TIMED_OUT: EventNumber = EventNumber(0x28);
    pub const SESSION_EXPIRED: EventNumber = EventNumber(0x29);
    pub const TRANSMISSION_TIME_LIMIT_ACTIVE: EventNumber = EventNumber(0x32);
    pub const TRANSMISSION_TIME_LIMIT_RELEASED: EventNumber = EventNumber(0x33);
    pub const WAKEUP_SIGNAL: EventNumber = EventNumber(SKSTACK_EVENT_NUM_WAKEUP_SIGNAL);

    pub fn description(&self) -> &'static str {
        match self.0 {
            0x01 => "NS received",
            0x02 => "NA received",
            0x05 => "echo request received",
            0x1F => "ED scan completed",
            0x20 => "beacon received",
            0x21 => "UDP send completed",
            0x22 => "active scan completed",
            0x24 => "PANA connect failed",
            0x25 => "PANA connect completed",
            0x26 => "session termination requested",
            0x27 => "session terminated",
            0x28 => "session termination timed out",
            0x29 => "session expired",
            0x32 => "transmission time limit active",
            0x33 => "transmission time limit released",
            0xC0 => "wakeup signal",
            _ => "unknown event",
        }
    }
}

impl fmt::Display for EventNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} ({})", self.0, self.description())
    }
}

/// Decoded `EVENT` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNotification {
    pub number: EventNumber,
    /// Absent only for the wakeup signal
    pub sender: Option<Ipv6Addr>,
    /// Present only for UDP send completed
    pub param: Option<u8>,
}

/// A decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    UdpReceived(UdpDatagram),
    Pong { sender: Ipv6Addr },
    AddressList(Vec<Ipv6Addr>),
    NeighborCache(Vec<NeighborCacheEntry>),
    PanDescription(PanDescription),
    EnergyDetectScan(Vec<EnergyDetection>),
    PortList(PortList),
    Notification(EventNotification),
}

impl Event {
    pub fn code(&self) -> EventCode {
        match self {
            Event::UdpReceived(_) => EventCode::Erxudp,
            Event::Pong { .. } => EventCode::Epong,
            Event::AddressList(_) => EventCode::Eaddr,
            Event::NeighborCache(_) => EventCode::Eneighbor,
            Event::PanDescription(_) => EventCode::Epandesc,
            Event::EnergyDetectScan(_) => EventCode::Eedscan,
            Event::PortList(_) => EventCode::Eport,
            Event::Notification(_) => EventCode::Event,
        }
    }
}

/// Decode the event of kind `code` starting at the beginning of `input`.
pub fn decode_event(code: EventCode, input: &[u8], options: &DecodeOptions) -> SequenceResult<Event> {
    match code {
        EventCode::Erxudp => parse_sequence(input, |i| erxudp(i, options.erxudp_data_format))
            .map(|o| o.map(Event::UdpReceived)),
        EventCode::Epong => {
            parse_sequence(input, epong).map(|o| o.map(|sender| Event::Pong { sender }))
        }
        EventCode::Eaddr => decode_eaddr(input).map(|o| o.map(Event::AddressList)),
        EventCode::Eneighbor => decode_eneighbor(input).map(|o| o.map(Event::NeighborCache)),
        EventCode::Epandesc => parse_sequence(input, |i| epandesc(i, options.expect_pairing_id))
            .map(|o| o.map(Event::PanDescription)),
        EventCode::Eedscan => {
            parse_sequence(input, eedscan).map(|o| o.map(Event::EnergyDetectScan))
        }
        EventCode::Eport => decode_eport(input).map(|o| o.map(Event::PortList)),
        EventCode::Event => {
            parse_sequence(input, event_notification).map(|o| o.map(Event::Notification))
        }
    }
}

fn crlf(input: &[u8]) -> TokenResult<'_, &[u8]> {
    literal(SKSTACK_CRLF)(input)
}

fn take_bytes(input: &[u8], count: usize) -> TokenResult<'_, &[u8]> {
    nom::bytes::streaming::take(count)(input)
}

/// `<label><field>\r\n`
fn labeled<'a, T>(
    input: &'a [u8],
    label: &'static [u8],
    field: impl Fn(&'a [u8]) -> TokenResult<'a, T>,
) -> TokenResult<'a, T> {
    let (input, _) = literal(label)(input)?;
    let (input, value) = field(input)?;
    let (input, _) = crlf(input)?;
    Ok((input, value))
}

fn erxudp(input: &[u8], format: ErxudpDataFormat) -> TokenResult<'_, UdpDatagram> {
    let (i, _) = literal(b"ERXUDP ")(input)?;
    let (i, sender) = ipaddr(i)?;
    let (i, dest) = ipaddr(i)?;
    let (i, rport) = uint16(i)?;
    let (i, lport) = uint16(i)?;
    let (i, sender_lla) = addr64(i)?;
    let (i, secured) = binary(i)?;
    let (i, len) = uint16(i)?;

    let (i, data) = match format {
        ErxudpDataFormat::Binary => {
            let (i, raw) = take_bytes(i, usize::from(len))?;
            (i, Bytes::copy_from_slice(raw))
        }
        ErxudpDataFormat::HexAscii => {
            let (rest, text) = take_bytes(i, usize::from(len) * 2)?;
            match hex::decode(text) {
                Ok(data) => (rest, Bytes::from(data)),
                Err(_) => {
                    let bad = text
                        .iter()
                        .copied()
                        .find(|b| !b.is_ascii_hexdigit())
                        .unwrap_or(b'?');
                    return Err(nom::Err::Error(TokenError::new(
                        i,
                        TokenErrorKind::InvalidHexDigit(bad),
                    )));
                }
            }
        }
    };
    let (i, _) = crlf(i)?;

    Ok((
        i,
        UdpDatagram {
            sender,
            dest,
            rport,
            lport,
            sender_lla,
            secured,
            data,
        },
    ))
}

fn epong(input: &[u8]) -> TokenResult<'_, Ipv6Addr> {
    let (i, _) = literal(b"EPONG ")(input)?;
    let (i, sender) = ipaddr(i)?;
    let (i, _) = crlf(i)?;
    Ok((i, sender))
}

fn epandesc(input: &[u8], expect_pairing_id: bool) -> TokenResult<'_, PanDescription> {
    let (i, _) = literal(b"EPANDESC\r\n")(input)?;
    let (i, channel) = labeled(i, b"  Channel:", channel)?;
    let (i, channel_page) = labeled(i, b"  Channel Page:", uint8)?;
    let (i, pan_id) = labeled(i, b"  Pan ID:", uint16)?;
    let (i, addr) = labeled(i, b"  Addr:", addr64)?;
    let (i, lqi) = labeled(i, b"  LQI:", uint8)?;
    let (i, pairing_id) = if expect_pairing_id {
        let (i, id) = labeled(i, b"  PairID:", uint32)?;
        (i, Some(id))
    } else {
        (i, None)
    };

    Ok((
        i,
        PanDescription {
            channel,
            channel_page,
            pan_id,
            addr,
            lqi,
            pairing_id,
        },
    ))
}

fn eedscan(input: &[u8]) -> TokenResult<'_, Vec<EnergyDetection>> {
    let (mut i, _) = literal(b"EEDSCAN\r\n")(input)?;
    let mut scan = Vec::with_capacity(SKSTACK_CHANNEL_COUNT);
    for _ in 0..SKSTACK_CHANNEL_COUNT {
        let (rest, channel) = channel(i)?;
        let (rest, lqi) = uint8(rest)?;
        scan.push(EnergyDetection { channel, lqi });
        i = rest;
    }
    let (i, _) = crlf(i)?;

    // Some firmware revisions emit an extra blank line
    let i = match i {
        [b'\r', b'\n', rest @ ..] => rest,
        [b'\r'] => return Err(nom::Err::Incomplete(nom::Needed::new(1))),
        _ => i,
    };
    Ok((i, scan))
}

fn event_notification(input: &[u8]) -> TokenResult<'_, EventNotification> {
    let (i, _) = literal(b"EVENT ")(input)?;
    let (i, number) = uint8(i)?;

    if number == SKSTACK_EVENT_NUM_WAKEUP_SIGNAL {
        let (i, _) = crlf(i)?;
        return Ok((
            i,
            EventNotification {
                number: EventNumber(number),
                sender: None,
                param: None,
            },
        ));
    }

    let (i, sender) = ipaddr(i)?;
    let (i, param) = if number == SKSTACK_EVENT_NUM_UDP_SEND_COMPLETED {
        let (i, param) = uint8(i)?;
        (i, Some(param))
    } else {
        (i, None)
    };
    let (i, _) = crlf(i)?;

    Ok((
        i,
        EventNotification {
            number: EventNumber(number),
            sender: Some(sender),
            param,
        },
    ))
}

/// Shared framing of EADDR, ENEIGHBOR and EPORT: a bare header line, one entry
/// per line, terminated by the status line of the command that asked for the
/// table. The status line is left for the correlator; blank lines are skipped.
fn decode_list<T>(
    input: &[u8],
    code: EventCode,
    mut entry: impl FnMut(&[u8]) -> Result<T, ProtocolError>,
) -> SequenceResult<Vec<T>> {
    let header = code.as_bytes();
    let header_len = header.len() + SKSTACK_CRLF.len();

    match next_line(input, SKSTACK_CRLF) {
        Some((content, _)) if &input[content.clone()] == header => {}
        Some(_) => return Ok(SequenceOutcome::Ignore),
        None => {
            let visible = input.len().min(header.len());
            return Ok(if input[..visible] == header[..visible] {
                SequenceOutcome::Incomplete
            } else {
                SequenceOutcome::Ignore
            });
        }
    }

    let mut pos = header_len;
    let mut entries = Vec::new();
    loop {
        let Some((content, len)) = next_line(&input[pos..], SKSTACK_CRLF) else {
            return Ok(SequenceOutcome::Incomplete);
        };
        let line = &input[pos..pos + len];
        let text = &line[content];
        if status_line(text).is_some() {
            break;
        }
        if !text.is_empty() {
            entries.push(entry(line)?);
        }
        pos += len;
    }

    Ok(SequenceOutcome::Complete {
        value: entries,
        consumed: pos,
    })
}

fn address_entry(line: &[u8]) -> TokenResult<'_, Ipv6Addr> {
    let (i, addr) = ipaddr(line)?;
    let (i, _) = crlf(i)?;
    Ok((i, addr))
}

fn neighbor_entry(line: &[u8]) -> TokenResult<'_, NeighborCacheEntry> {
    let (i, ip_address) = ipaddr(line)?;
    let (i, addr64) = addr64(i)?;
    let (i, addr16) = uint16(i)?;
    let (i, _) = crlf(i)?;
    Ok((
        i,
        NeighborCacheEntry {
            ip_address,
            addr64,
            addr16,
        },
    ))
}

fn port_entry(line: &[u8]) -> TokenResult<'_, u16> {
    let (i, port) = decimal_number(line)?;
    let port = u16::try_from(port)
        .map_err(|_| nom::Err::Error(TokenError::new(line, TokenErrorKind::OutOfRange)))?;
    let (i, _) = crlf(i)?;
    Ok((i, port))
}

/// Decode an EADDR address table.
pub fn decode_eaddr(input: &[u8]) -> SequenceResult<Vec<Ipv6Addr>> {
    decode_list(input, EventCode::Eaddr, |line| parse_complete(line, address_entry))
}

/// Decode an ENEIGHBOR neighbor cache table.
pub fn decode_eneighbor(input: &[u8]) -> SequenceResult<Vec<NeighborCacheEntry>> {
    decode_list(input, EventCode::Eneighbor, |line| parse_complete(line, neighbor_entry))
}

/// Decode an EPORT table: six UDP ports followed by four TCP ports.
pub fn decode_eport(input: &[u8]) -> SequenceResult<PortList> {
    let (value, consumed) =
        match decode_list(input, EventCode::Eport, |line| parse_complete(line, port_entry))? {
            SequenceOutcome::Complete { value, consumed } => (value, consumed),
            SequenceOutcome::Ignore => return Ok(SequenceOutcome::Ignore),
            SequenceOutcome::Incomplete => return Ok(SequenceOutcome::Incomplete),
        };

    let expected = SKSTACK_UDP_PORT_COUNT + SKSTACK_TCP_PORT_COUNT;
    if value.len() != expected {
        return Err(ProtocolError::new(
            TokenErrorKind::ItemCount {
                expected,
                actual: value.len(),
            },
            input,
        ));
    }

    let mut ports = PortList::default();
    ports.udp.copy_from_slice(&value[..SKSTACK_UDP_PORT_COUNT]);
    ports.tcp.copy_from_slice(&value[SKSTACK_UDP_PORT_COUNT..]);
    Ok(SequenceOutcome::Complete {
        value: ports,
        consumed,
    })
}
