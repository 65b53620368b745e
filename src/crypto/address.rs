//! 20-byte contract address.

use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

use super::keccak256;

/// A contract address (20 bytes).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// The lowest 16 bits of the address, read big-endian from the last two
    /// bytes. Hook flags live here.
    #[inline]
    pub const fn low_bits(&self) -> u16 {
        u16::from_be_bytes([self.0[18], self.0[19]])
    }

    /// Lowercase hex (no 0x).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 mixed-case checksum with 0x prefix.
    pub fn to_checksum(&self) -> String {
        let lower = self.to_hex();
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Address {
    type Err = InputError;

    /// Parses 40 hex characters with or without a 0x prefix. Checksum case is
    /// not enforced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let h = s.strip_prefix("0x").unwrap_or(s);
        if h.len() != 40 {
            return Err(InputError::InvalidAddress(format!(
                "{s}: expected 40 hex characters, got {}",
                h.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(h, &mut bytes)
            .map_err(|e| InputError::InvalidAddress(format!("{s}: {e}")))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}
