//! # Response/Event Correlator
//!
//! [`SkStackClient`] owns the transport and the [`UnreadBuffer`] and runs the
//! read loop shared by command exchanges and event polling:
//!
//! 1. classify the earliest complete line of the buffer,
//! 2. drop it if it is the expected echo,
//! 3. finalise the response on a status line,
//! 4. try the event decoder for event lines, falling back to response data,
//! 5. read more bytes from the transport whenever nothing is classifiable.
//!
//! Decoders never consume a partial event; an incomplete decode simply reads
//! more input and retries from the same position. Events that arrive while a
//! command is pending are dispatched to the subscriber in wire order and are
//! also recorded in the [`Response`].
//!
//! Callers must serialize commands: the client holds at most one exchange at
//! a time, which the `&mut self` receivers enforce for a single owner.

use crate::error::SkStackError;
use crate::skstack::event::{self, DecodeOptions, ErxudpDataFormat, Event};
use crate::skstack::frame::{self, LineKind};
use crate::skstack::response::{Response, ResponseBuilder, ResponseStatus};
use crate::skstack::sequence::{SequenceContext, SequenceOutcome};
use crate::skstack::syntax::ProtocolSyntax;
use crate::skstack::writer::Command;
use crate::util::iobuffer::{IoBufferError, UnreadBuffer};
use crate::util::logging::{escape_line, log_received, log_sent, LogThrottle};
use bytes::Bytes;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Default time allowed for one command exchange
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5000;

/// Client behaviour that depends on the module firmware and its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub erxudp_data_format: ErxudpDataFormat,
    pub expect_pairing_id: bool,
    /// `None` waits forever
    pub response_timeout_ms: Option<u64>,
    /// `None` lets the receive buffer grow without bound
    pub max_buffer_len: Option<usize>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            erxudp_data_format: ErxudpDataFormat::Binary,
            expect_pairing_id: false,
            response_timeout_ms: Some(DEFAULT_RESPONSE_TIMEOUT_MS),
            max_buffer_len: None,
        }
    }
}

impl ClientOptions {
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }

    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            erxudp_data_format: self.erxudp_data_format,
            expect_pairing_id: self.expect_pairing_id,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SkStackError> {
        serde_json::from_str(json).map_err(|e| SkStackError::Config(e.to_string()))
    }

    /// Load options from a JSON file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SkStackError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SkStackError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

/// How much [`SkStackClient::try_receive`] processes per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveMode {
    /// Every complete line currently buffered
    Drain,
    /// Stop after the first decoded event
    SingleEvent,
}

/// Result of classifying and consuming one unit of the buffer.
enum Step {
    NeedMore,
    Echo,
    Status { status: ResponseStatus, text: Bytes },
    Event(Event),
    Data(Bytes),
    Blank,
}

/// Protocol engine over a byte-duplex transport.
pub struct SkStackClient<T> {
    transport: T,
    buffer: UnreadBuffer,
    options: ClientOptions,
    subscriber: Option<mpsc::UnboundedSender<Event>>,
    discard_throttle: LogThrottle,
}

impl<T> SkStackClient<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, ClientOptions::default())
    }

    pub fn with_options(transport: T, options: ClientOptions) -> Self {
        let mut buffer = UnreadBuffer::new();
        buffer.set_capacity_limit(options.max_buffer_len);
        SkStackClient {
            transport,
            buffer,
            options,
            subscriber: None,
            discard_throttle: LogThrottle::new(Duration::from_secs(1), 5),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ClientOptions) {
        self.buffer.set_capacity_limit(options.max_buffer_len);
        self.options = options;
    }

    /// Receive every event decoded from now on.
    ///
    /// Replaces an earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriber = Some(tx);
        rx
    }

    /// Bytes received but not yet consumed.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.unread()
    }

    /// Drop the first complete CRLF-terminated line, e.g. after a decode error.
    ///
    /// Returns `false` when no complete line is buffered.
    pub fn skip_line(&mut self) -> bool {
        match frame::next_line(self.buffer.unread(), crate::constants::SKSTACK_CRLF) {
            Some((content, len)) => {
                debug!("skipping line: {}", escape_line(&self.buffer.unread()[content]));
                self.buffer.advance(len);
                true
            }
            None => false,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Write `command` and wait for its response.
    ///
    /// The exchange is bounded by the configured response timeout. A `FAIL`
    /// status is returned as a response; use [`Response::into_result`] to turn
    /// it into an error.
    pub async fn send_command(&mut self, command: &Command) -> Result<Response, SkStackError> {
        let limit = self.options.response_timeout();
        self.write_command(command).await?;

        let exchange = self.receive_response(Some(command.echo()), command.syntax());
        match limit {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| SkStackError::Timeout)?,
            None => exchange.await,
        }
    }

    /// Write a command line without waiting for the response.
    pub async fn write_command(&mut self, command: &Command) -> Result<(), SkStackError> {
        log_sent(command.display());
        self.transport.write_all(command.as_bytes()).await?;
        self.transport.flush().await?;
        Ok(())
    }

    /// Collect one response.
    ///
    /// `expected_echo` is matched against lines until either the echo or the
    /// first non-event line has been seen. With a syntax that expects no
    /// status line the response ends after its first data line.
    pub async fn receive_response(
        &mut self,
        expected_echo: Option<&[u8]>,
        syntax: &ProtocolSyntax,
    ) -> Result<Response, SkStackError> {
        let mut builder = ResponseBuilder::new();
        let mut echo = expected_echo;

        loop {
            match self.step(syntax, echo)? {
                Step::NeedMore => self.fill_buffer().await?,
                Step::Echo => echo = None,
                Step::Status { status, text } => {
                    trace!("status {status} after {} data lines", builder.line_count());
                    return Ok(builder.finish(status, text));
                }
                Step::Event(event) => {
                    builder.push_event(event.clone());
                    self.dispatch(event);
                }
                Step::Data(line) => {
                    echo = None;
                    builder.push_line(line);
                    if !syntax.expect_status_line {
                        return Ok(builder.finish(ResponseStatus::Undetermined, Bytes::new()));
                    }
                }
                Step::Blank => {}
            }
        }
    }

    /// Process unsolicited input with no command pending.
    ///
    /// Buffered lines are handled first; only if none could be handled is the
    /// transport read, exactly once. Returns whether an event was observed.
    pub async fn try_receive(&mut self, mode: ReceiveMode) -> Result<bool, SkStackError> {
        let mut seen = false;
        let mut progress = false;
        let mut read = false;

        loop {
            match self.step(&ProtocolSyntax::DEFAULT, None)? {
                Step::NeedMore => {
                    if progress || read {
                        return Ok(seen);
                    }
                    self.fill_buffer().await?;
                    read = true;
                }
                Step::Event(event) => {
                    self.dispatch(event);
                    seen = true;
                    progress = true;
                    if mode == ReceiveMode::SingleEvent {
                        return Ok(true);
                    }
                }
                Step::Status { status, text } => {
                    self.discard_status(status, &text);
                    progress = true;
                }
                Step::Data(line) => {
                    self.discard(&line);
                    progress = true;
                }
                Step::Echo | Step::Blank => progress = true,
            }
        }
    }

    /// Wait for the next event and return it.
    ///
    /// The event is handed to the caller only, not to the subscriber.
    pub async fn receive_event(&mut self) -> Result<Event, SkStackError> {
        loop {
            match self.step(&ProtocolSyntax::DEFAULT, None)? {
                Step::NeedMore => self.fill_buffer().await?,
                Step::Event(event) => {
                    debug!("event {}: {event:?}", event.code());
                    return Ok(event);
                }
                Step::Status { status, text } => self.discard_status(status, &text),
                Step::Data(line) => self.discard(&line),
                Step::Echo | Step::Blank => {}
            }
        }
    }

    /// Classify the first buffered line and consume it if it was handled.
    fn step(&mut self, syntax: &ProtocolSyntax, expected_echo: Option<&[u8]>) -> Result<Step, SkStackError> {
        // A CRLF line read with the CR-only terminator leaves its LF behind
        if self.buffer.unread().first() == Some(&b'\n') {
            self.buffer.advance(1);
        }

        let Some(line) = frame::classify(self.buffer.unread(), syntax, expected_echo) else {
            return Ok(Step::NeedMore);
        };

        match line.kind {
            LineKind::Echo => {
                self.buffer.advance(line.len);
                Ok(Step::Echo)
            }
            LineKind::Status { status, text } => {
                let raw = self.buffer.consume(line.len);
                Ok(Step::Status {
                    status,
                    text: raw.slice(text),
                })
            }
            LineKind::EventCandidate(code) => {
                let options = self.options.decode_options();
                let mut ctx = SequenceContext::new(&mut self.buffer);
                match ctx.decode(|unread| event::decode_event(code, unread, &options))? {
                    SequenceOutcome::Complete { value, .. } => Ok(Step::Event(value)),
                    SequenceOutcome::Incomplete => Ok(Step::NeedMore),
                    SequenceOutcome::Ignore => Ok(Step::Data(self.buffer.consume(line.len))),
                }
            }
            LineKind::Data if line.content.is_empty() => {
                self.buffer.advance(line.len);
                Ok(Step::Blank)
            }
            LineKind::Data => Ok(Step::Data(self.buffer.consume(line.len))),
        }
    }

    /// Read once from the transport into the buffer.
    async fn fill_buffer(&mut self) -> Result<(), SkStackError> {
        self.buffer.try_reserve(1).map_err(|e| match e {
            IoBufferError::CapacityExceeded { limit } => SkStackError::BufferOverflow { limit },
        })?;

        let before = self.buffer.len();
        let n = self.buffer.fill_from(&mut self.transport).await?;
        if n == 0 {
            debug!("transport closed with {} bytes unread", self.buffer.len());
            return Err(SkStackError::ConnectionClosed);
        }
        log_received(&self.buffer.unread()[before..]);
        Ok(())
    }

    fn dispatch(&mut self, event: Event) {
        debug!("event {}: {event:?}", event.code());
        if let Some(tx) = &self.subscriber {
            if tx.send(event).is_err() {
                debug!("event subscriber dropped");
                self.subscriber = None;
            }
        }
    }

    fn discard(&mut self, line: &[u8]) {
        if self.discard_throttle.allow() {
            debug!("discarding unsolicited line: {}", escape_line(line));
        }
    }

    fn discard_status(&mut self, status: ResponseStatus, text: &[u8]) {
        if self.discard_throttle.allow() {
            debug!("discarding unsolicited status {status} {}", escape_line(text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skstack::mock::MockSerialPort;
    use crate::skstack::writer::CommandLineWriter;
    use tokio_test::io::Builder;

    #[test]
    fn test_options_json_defaults() {
        let options = ClientOptions::from_json(r#"{"erxudp_data_format": "hex_ascii"}"#).unwrap();
        assert_eq!(options.erxudp_data_format, ErxudpDataFormat::HexAscii);
        assert_eq!(options.response_timeout(), Some(Duration::from_secs(5)));
        assert!(!options.expect_pairing_id);

        assert!(matches!(
            ClientOptions::from_json("{"),
            Err(SkStackError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_echo_is_suppressed() {
        let mock = Builder::new()
            .write(b"TEST ARG1 ARG2 ARG3\r\n")
            .read(b"TEST ARG1 ARG2 ARG3\r\nOK\r\n")
            .build();
        let mut client = SkStackClient::new(mock);

        let mut writer = CommandLineWriter::new("TEST").unwrap();
        writer.token(b"ARG1").unwrap().token(b"ARG2").unwrap().token(b"ARG3").unwrap();
        let response = client.send_command(&writer.finish()).await.unwrap();

        assert_eq!(response.status(), ResponseStatus::Ok);
        assert!(response.is_empty());
        assert!(response.status_text().is_empty());
    }

    #[tokio::test]
    async fn test_fragment_stays_buffered() {
        let mock = Builder::new().read(b"OK DONE\r\nEVEN").build();
        let mut client = SkStackClient::new(mock);

        let response = client.receive_response(None, &ProtocolSyntax::DEFAULT).await.unwrap();
        assert_eq!(response.status_text(), b"DONE");
        assert_eq!(client.buffered(), b"EVEN");
    }

    #[tokio::test]
    async fn test_no_status_line() {
        let mock = Builder::new()
            .read(b"SKLL64 001D129012345678\r\nFE80:0000:0000:0000:021D:1290:1234:5678\r\n")
            .build();
        let mut client = SkStackClient::new(mock);

        let response = client
            .receive_response(Some(b"SKLL64 001D129012345678\r\n"), &ProtocolSyntax::NO_STATUS_LINE)
            .await
            .unwrap();
        assert_eq!(response.status(), ResponseStatus::Undetermined);
        assert_eq!(response.len(), 1);
    }

    #[tokio::test]
    async fn test_connection_closed() {
        let mock = Builder::new().read(b"O").build();
        let mut client = SkStackClient::new(mock);

        let err = client.receive_response(None, &ProtocolSyntax::DEFAULT).await.unwrap_err();
        assert!(matches!(err, SkStackError::ConnectionClosed));
        assert_eq!(client.buffered(), b"O");
    }

    #[tokio::test]
    async fn test_buffer_limit() {
        let port = MockSerialPort::new();
        port.queue_rx_data(&[b'A'; 500]);
        let options = ClientOptions {
            max_buffer_len: Some(16),
            ..ClientOptions::default()
        };
        let mut client = SkStackClient::with_options(port.clone(), options);

        let err = client.receive_event().await.unwrap_err();
        assert!(matches!(err, SkStackError::BufferOverflow { limit: 16 }));
        assert_eq!(client.buffered().len(), 16);
        assert_eq!(port.pending_reads(), 1);
    }
}
