//! # Ledger Snapshots
//!
//! Durable layout of the ledger state: the multi-envelope mapping
//! `(depositor, payee) -> envelopes` and the single-lock mapping
//! `owner -> envelope`.
//!
//! ## Format
//!
//! `[MAGIC (8 bytes)][bincode(LedgerSnapshot)]`
//!
//! Entries are sorted by key so equal states encode to equal bytes.

use super::entities::{Envelope, EnvelopeSequence};
use super::errors::EscrowError;
use super::invariants::{check_sequence, InvariantViolation};
use super::value_objects::{Address, Amount, EnvelopeKey};
use serde::{Deserialize, Serialize};

/// Magic bytes of an encoded snapshot.
const SNAPSHOT_MAGIC: &[u8; 8] = b"TLESCRW\x01";

/// Point-in-time copy of the ledger storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Multi-envelope entries.
    pub envelopes: Vec<(EnvelopeKey, EnvelopeSequence)>,
    /// Single-lock entries.
    pub locks: Vec<(Address, Envelope)>,
}

impl LedgerSnapshot {
    /// Build a snapshot, sorting entries by key.
    #[must_use]
    pub fn new(
        mut envelopes: Vec<(EnvelopeKey, EnvelopeSequence)>,
        mut locks: Vec<(Address, Envelope)>,
    ) -> Self {
        envelopes.sort_by_key(|(key, _)| *key);
        locks.sort_by_key(|(owner, _)| *owner);
        Self { envelopes, locks }
    }

    /// Sum of all multi-envelope amounts.
    pub fn envelope_total(&self) -> Result<Amount, EscrowError> {
        self.envelopes.iter().try_fold(0 as Amount, |acc, (_, seq)| {
            acc.checked_add(seq.total_locked()?)
                .ok_or(EscrowError::Overflow)
        })
    }

    /// Sum of all single-lock amounts.
    pub fn lock_total(&self) -> Result<Amount, EscrowError> {
        self.locks.iter().try_fold(0 as Amount, |acc, (_, env)| {
            acc.checked_add(env.amount_locked)
                .ok_or(EscrowError::Overflow)
        })
    }

    /// Check every entry against the data-model invariants.
    pub fn validate(&self, capacity: usize) -> Result<(), InvariantViolation> {
        for (key, sequence) in &self.envelopes {
            check_sequence(*key, sequence, capacity)?;
        }
        for (owner, envelope) in &self.locks {
            if envelope.amount_locked == 0 {
                return Err(InvariantViolation::EmptyLock { owner: *owner });
            }
        }
        Ok(())
    }

    /// Encode to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, EscrowError> {
        let body = bincode::serialize(self).map_err(|e| EscrowError::Storage(e.to_string()))?;
        let mut buf = Vec::with_capacity(SNAPSHOT_MAGIC.len() + body.len());
        buf.extend_from_slice(SNAPSHOT_MAGIC);
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Decode from bytes produced by [`LedgerSnapshot::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, EscrowError> {
        let body = bytes
            .strip_prefix(SNAPSHOT_MAGIC.as_slice())
            .ok_or_else(|| EscrowError::Storage("invalid snapshot magic".to_string()))?;
        bincode::deserialize(body).map_err(|e| EscrowError::Storage(e.to_string()))
    }
}
