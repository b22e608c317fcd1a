//! # Domain Value Objects
//!
//! Immutable value types shared by both ledger variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value in the smallest native unit.
pub type Amount = u128;

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Opaque 20-byte account identity.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Storage key of the multi-envelope ledger: one bounded envelope
/// sequence per (depositor, payee) pair.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EnvelopeKey {
    /// Party that funded the envelopes.
    pub depositor: Address,
    /// Party that receives disbursed value.
    pub payee: Address,
}

impl EnvelopeKey {
    /// Create a key for the given pair.
    #[must_use]
    pub const fn new(depositor: Address, payee: Address) -> Self {
        Self { depositor, payee }
    }
}

impl fmt::Display for EnvelopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.depositor, self.payee)
    }
}

/// What a single-lock deposit does when the beneficiary already holds a lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Refuse the deposit; the existing lock stays untouched.
    #[default]
    Reject,
    /// Replace the existing lock. The discarded value is booked as orphaned.
    Replace,
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "replace" => Ok(Self::Replace),
            other => Err(format!("unknown overwrite policy: {other}")),
        }
    }
}
