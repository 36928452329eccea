//! # SKSTACK IP Protocol Engine
//!
//! Line-oriented ASCII command/response protocol of SKSTACK IP wireless
//! smart-meter modules, with unsolicited events interleaved on the same
//! stream.
//!
//! Modules, leaves first:
//!
//! - [`token`], [`address`], [`channel`]: hex/decimal/address token codec
//! - [`sequence`]: commit-or-rollback decode outcomes
//! - [`syntax`]: per command family line conventions
//! - [`frame`]: line extraction and classification
//! - [`event`]: one decoder per event code
//! - [`error_code`]: `FAIL` status mapping
//! - [`client`]: the response/event correlator
//! - [`writer`], [`commands`]: outbound command lines
//! - [`serial`], [`mock`]: transports

pub mod address;
pub mod channel;
pub mod client;
pub mod commands;
pub mod error_code;
pub mod event;
pub mod frame;
pub mod mock;
pub mod response;
pub mod sequence;
pub mod serial;
pub mod syntax;
pub mod token;
pub mod writer;

pub use address::Addr64;
pub use channel::Channel;
pub use client::{ClientOptions, ReceiveMode, SkStackClient};
pub use commands::LocalInfo;
pub use error_code::{DeviceError, ErrorCode};
pub use event::{
    DecodeOptions, EnergyDetection, ErxudpDataFormat, Event, EventCode, EventNotification,
    EventNumber, NeighborCacheEntry, PanDescription, PortList, UdpDatagram,
};
pub use response::{Response, ResponseStatus};
pub use sequence::{SequenceContext, SequenceOutcome};
pub use serial::SerialConfig;
pub use syntax::ProtocolSyntax;
pub use writer::{Command, CommandLineWriter};
