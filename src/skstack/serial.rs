//! # SKSTACK Serial Transport
//!
//! Opens the serial port a SKSTACK module is attached to and wraps it in an
//! [`SkStackClient`]. The module talks 8N1 without flow control; only the
//! baud rate differs between products.

use crate::error::SkStackError;
use crate::skstack::client::{ClientOptions, SkStackClient};
use std::time::Duration;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Default baud rate of SKSTACK modules
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Configuration for serial connection.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baudrate: u32,
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: DEFAULT_BAUDRATE,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Opens `port_name` with the SKSTACK line settings.
pub fn open_port(port_name: &str, config: &SerialConfig) -> Result<SerialStream, SkStackError> {
    let port = tokio_serial::new(port_name, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::None)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(config.timeout)
        .open_native_async()?;
    log::info!("opened {port_name} at {} baud", config.baudrate);
    Ok(port)
}

impl SkStackClient<SerialStream> {
    /// Establishes a connection to the serial port using the default settings.
    pub async fn connect(port_name: &str) -> Result<Self, SkStackError> {
        Self::connect_with_config(port_name, SerialConfig::default(), ClientOptions::default()).await
    }

    /// Establishes a connection with custom port settings and client options.
    pub async fn connect_with_config(
        port_name: &str,
        config: SerialConfig,
        options: ClientOptions,
    ) -> Result<Self, SkStackError> {
        let port = open_port(port_name, &config)?;
        Ok(SkStackClient::with_options(port, options))
    }
}
