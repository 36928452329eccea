//! 64-bit hardware (MAC) address as carried by `ADDR64` tokens.

use std::fmt;
use std::str::FromStr;

/// IEEE EUI-64 hardware address of a module or a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Addr64(pub [u8; 8]);

impl Addr64 {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Addr64(bytes)
    }

    pub const fn from_u64(value: u64) -> Self {
        Addr64(value.to_be_bytes())
    }

    pub const fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for Addr64 {
    fn from(bytes: [u8; 8]) -> Self {
        Addr64(bytes)
    }
}

/// Formats as colon separated uppercase octets, e.g. `00:1D:12:90:12:34:56:78`.
impl fmt::Display for Addr64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::UpperHex for Addr64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.to_u64())
    }
}

/// Accepts both the wire form (`001D129012345678`) and the colon form.
impl FromStr for Addr64 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(compact, &mut bytes)?;
        Ok(Addr64(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let addr = Addr64::from_u64(0x001D_1290_1234_5678);
        assert_eq!(addr.to_string(), "00:1D:12:90:12:34:56:78");
        assert_eq!(format!("{addr:X}"), "001D129012345678");
    }

    #[test]
    fn test_parse_forms() {
        let a: Addr64 = "001D129012345678".parse().unwrap();
        let b: Addr64 = "00:1D:12:90:12:34:56:78".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_u64(), 0x001D_1290_1234_5678);
        assert!("001D1290".parse::<Addr64>().is_err());
    }
}
