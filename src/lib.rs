//! # skstack-rs - A Rust Crate for SKSTACK IP Wireless Smart-Meter Modules
//!
//! The skstack-rs crate talks to SKSTACK IP modules (Wi-SUN / route-B
//! smart-meter communication modules) over a serial line. The module speaks a
//! line-oriented ASCII command/response protocol and interleaves unsolicited
//! events (received datagrams, scan results, session notifications) with the
//! replies on the same stream.
//!
//! ## Features
//!
//! - Incremental line framing tolerant of arbitrary partial reads
//! - Fixed-width hex, decimal, IPv6 and hardware-address token codec
//! - Decoders for every event code (ERXUDP, EPONG, EADDR, ENEIGHBOR, EPANDESC,
//!   EEDSCAN, EPORT, EVENT)
//! - Response/event correlation with echo suppression and per-command line syntax
//! - Structured `FAIL` error codes
//! - Typed helpers for the common commands (SKINFO, SKSENDTO, SKTABLE, ...)
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! skstack-rs = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use skstack_rs::{connect, init_logger, ReceiveMode};
//!
//! # async fn run() -> Result<(), skstack_rs::SkStackError> {
//! init_logger();
//! let mut client = connect("/dev/ttyUSB0").await?;
//! let info = client.sk_info().await?;
//! println!("{} on channel {}", info.link_local_address, info.channel);
//!
//! let mut events = client.subscribe();
//! while client.try_receive(ReceiveMode::Drain).await.is_ok() {
//!     while let Ok(event) = events.try_recv() {
//!         println!("{event:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
pub mod logging;
pub mod skstack;
pub mod util;

pub use crate::error::{ProtocolError, SkStackError};
pub use crate::logging::{init_logger, log_info};

// Core protocol types
pub use skstack::{
    Addr64, Channel, ClientOptions, Command, CommandLineWriter, DeviceError, ErrorCode,
    ErxudpDataFormat, Event, EventCode, LocalInfo, ProtocolSyntax, ReceiveMode, Response,
    ResponseStatus, SerialConfig, SkStackClient,
};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::SerialStream;

/// Connect to a SKSTACK module via serial port.
///
/// # Arguments
/// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
///
/// # Returns
/// * `Ok(SkStackClient)` - Client ready to send commands
/// * `Err(SkStackError)` - Connection failed
pub async fn connect(port: &str) -> Result<SkStackClient<SerialStream>, SkStackError> {
    SkStackClient::connect(port).await
}

/// Send a command and wait for its response.
///
/// # Arguments
/// * `client` - Client to send through
/// * `command` - Encoded command line
///
/// # Returns
/// * `Ok(Response)` - The finalised response, `FAIL` included
/// * `Err(SkStackError)` - Transport, timeout or protocol failure
pub async fn send_command<T>(
    client: &mut SkStackClient<T>,
    command: &Command,
) -> Result<Response, SkStackError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    client.send_command(command).await
}

/// Process unsolicited input and dispatch decoded events to the subscriber.
///
/// # Returns
/// * `Ok(true)` - At least one event was observed
/// * `Ok(false)` - No event was observed
/// * `Err(SkStackError)` - Transport or protocol failure
pub async fn try_receive<T>(
    client: &mut SkStackClient<T>,
    mode: ReceiveMode,
) -> Result<bool, SkStackError>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    client.try_receive(mode).await
}
