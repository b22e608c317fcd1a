//! # Domain Invariants
//!
//! Rules that must hold at every observation point of the ledger.
//!
//! - Stored envelopes carry a positive amount.
//! - A key never holds more envelopes than the configured capacity.
//! - Sequence numbers strictly increase, and the next one is unused.
//! - Custody `held` equals the sum of all stored envelopes (conservation).

use super::entities::EnvelopeSequence;
use super::errors::EscrowError;
use super::value_objects::{Address, Amount, EnvelopeKey};
use std::fmt;

/// Deposits and withdrawals must move a positive amount.
pub fn invariant_positive_amount(amount: Amount) -> Result<(), EscrowError> {
    if amount == 0 {
        return Err(EscrowError::ZeroAmount);
    }
    Ok(())
}

/// A key may not grow past `capacity` envelopes.
///
/// `occupied` counts stored envelopes plus envelopes whose release is still
/// in flight, so a rolled-back release always fits again.
pub fn invariant_capacity(
    key: EnvelopeKey,
    occupied: usize,
    capacity: usize,
) -> Result<(), EscrowError> {
    if occupied >= capacity {
        return Err(EscrowError::CapacityExceeded { key, capacity });
    }
    Ok(())
}

/// Custody must match the value actually stored.
pub fn invariant_conservation(held: Amount, stored: Amount) -> Result<(), InvariantViolation> {
    if held != stored {
        return Err(InvariantViolation::ConservationBroken { held, stored });
    }
    Ok(())
}

/// Validate a stored sequence against the data-model rules.
pub fn check_sequence(
    key: EnvelopeKey,
    sequence: &EnvelopeSequence,
    capacity: usize,
) -> Result<(), InvariantViolation> {
    if sequence.len() > capacity {
        return Err(InvariantViolation::CapacityBreached {
            key,
            len: sequence.len(),
            capacity,
        });
    }
    if sequence
        .slots()
        .iter()
        .any(|slot| slot.envelope.amount_locked == 0)
    {
        return Err(InvariantViolation::EmptyEnvelope { key });
    }
    if sequence.slots().windows(2).any(|w| w[0].seq >= w[1].seq) {
        return Err(InvariantViolation::OrderBroken { key });
    }
    if let Some(last) = sequence.slots().last() {
        if sequence.next_seq() <= last.seq {
            return Err(InvariantViolation::StaleCounter {
                key,
                next_seq: sequence.next_seq(),
                last_seq: last.seq,
            });
        }
    }
    Ok(())
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Custody and stored value disagree.
    ConservationBroken {
        /// Value booked as held.
        held: Amount,
        /// Value found in storage.
        stored: Amount,
    },
    /// A key holds more envelopes than allowed.
    CapacityBreached {
        /// Offending key.
        key: EnvelopeKey,
        /// Envelopes stored under the key.
        len: usize,
        /// Configured bound.
        capacity: usize,
    },
    /// A stored envelope has a zero amount.
    EmptyEnvelope {
        /// Key holding the envelope.
        key: EnvelopeKey,
    },
    /// A single lock has a zero amount.
    EmptyLock {
        /// Beneficiary of the lock.
        owner: Address,
    },
    /// Sequence numbers are not strictly increasing.
    OrderBroken {
        /// Offending key.
        key: EnvelopeKey,
    },
    /// The next sequence number is already taken by a stored envelope.
    StaleCounter {
        /// Offending key.
        key: EnvelopeKey,
        /// Number the next deposit would receive.
        next_seq: u64,
        /// Highest stored sequence number.
        last_seq: u64,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConservationBroken { held, stored } => {
                write!(f, "conservation broken: custody {held} != stored {stored}")
            }
            Self::CapacityBreached { key, len, capacity } => {
                write!(f, "key {key} holds {len} envelopes, capacity {capacity}")
            }
            Self::EmptyEnvelope { key } => write!(f, "key {key} stores a zero-value envelope"),
            Self::EmptyLock { owner } => write!(f, "lock of {owner} is zero-value"),
            Self::OrderBroken { key } => write!(f, "key {key} is out of deposit order"),
            Self::StaleCounter {
                key,
                next_seq,
                last_seq,
            } => write!(
                f,
                "key {key} would reuse sequence number {next_seq} (last stored {last_seq})"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}
