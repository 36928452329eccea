//! Radio channel table.
//!
//! The module addresses its 28 usable channels with the raw values
//! `0x21..=0x3C`, which map onto the channel numbers 33 to 60. Any raw value
//! outside the table is rejected by the token decoder.

use crate::constants::{
    SKSTACK_CHANNEL_BASE_FREQUENCY_KHZ, SKSTACK_CHANNEL_COUNT, SKSTACK_CHANNEL_FIRST,
    SKSTACK_CHANNEL_LAST, SKSTACK_CHANNEL_SPACING_KHZ,
};
use std::fmt;

/// One entry of the channel table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    raw: u8,
}

impl Channel {
    /// Looks up a raw channel value (`0x21` is channel 33).
    pub fn from_raw(raw: u8) -> Option<Channel> {
        (SKSTACK_CHANNEL_FIRST..=SKSTACK_CHANNEL_LAST)
            .contains(&raw)
            .then_some(Channel { raw })
    }

    /// Looks up a channel by its number (33..=60).
    pub fn from_number(number: u8) -> Option<Channel> {
        Self::from_raw(number)
    }

    /// Position within the table, starting at zero.
    pub fn index(&self) -> usize {
        (self.raw - SKSTACK_CHANNEL_FIRST) as usize
    }

    /// Raw value as carried on the wire.
    pub fn raw(&self) -> u8 {
        self.raw
    }

    /// Channel number; raw values are the channel number in hex.
    pub fn number(&self) -> u8 {
        self.raw
    }

    pub fn frequency_khz(&self) -> u32 {
        SKSTACK_CHANNEL_BASE_FREQUENCY_KHZ + self.index() as u32 * SKSTACK_CHANNEL_SPACING_KHZ
    }

    pub fn frequency_mhz(&self) -> f64 {
        f64::from(self.frequency_khz()) / 1000.0
    }

    /// Bit of this channel in a SKSCAN channel mask.
    pub fn mask_bit(&self) -> u32 {
        1 << self.index()
    }

    /// Iterates the whole table in ascending order.
    pub fn all() -> impl Iterator<Item = Channel> {
        (SKSTACK_CHANNEL_FIRST..=SKSTACK_CHANNEL_LAST).map(|raw| Channel { raw })
    }

    pub const fn table_len() -> usize {
        SKSTACK_CHANNEL_COUNT
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{} ({:.1} MHz)", self.number(), self.frequency_mhz())
    }
}
