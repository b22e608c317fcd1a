//! # Domain Errors
//!
//! Every rejected ledger operation surfaces as an [`EscrowError`]. A failed
//! call leaves ledger state exactly as it was before the call.

use super::value_objects::{Address, Amount, EnvelopeKey, Timestamp};
use thiserror::Error;

/// Escrow ledger error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Deposit would exceed the per-key envelope bound.
    #[error("You cannot have more than {capacity} deposits for one payee.")]
    CapacityExceeded {
        /// Key that is full.
        key: EnvelopeKey,
        /// Configured capacity.
        capacity: usize,
    },

    /// Disbursement requested for a key that never received a deposit.
    #[error("There is no deposit envelops for given depositor and payee.")]
    NoEnvelopesForKey {
        /// Requested key.
        key: EnvelopeKey,
    },

    /// Key exists but no envelope has reached its unlock time.
    #[error("There is no eligible deposit envelops for disbursement for given depositor and payee.")]
    NothingEligibleYet {
        /// Requested key.
        key: EnvelopeKey,
        /// Earliest unlock time among the remaining envelopes.
        next_unlock: Option<Timestamp>,
    },

    /// Single-lock withdrawal attempted before the unlock time.
    #[error("You can't withdraw yet.")]
    TooEarly {
        /// Unlock time of the lock.
        locked_until: Timestamp,
        /// Time the call executed at.
        now: Timestamp,
    },

    /// Single-lock withdrawal with no matching lock or insufficient amount.
    #[error("You don't have any balance to withdraw.")]
    NoBalance {
        /// Caller that attempted the withdrawal.
        owner: Address,
    },

    /// Zero-value deposit or withdrawal.
    #[error("Amount must be greater than zero.")]
    ZeroAmount,

    /// Single-lock deposit refused because the beneficiary already holds a lock.
    #[error("Beneficiary {owner} already holds a lock of {amount_locked}.")]
    LockOccupied {
        /// Beneficiary of the existing lock.
        owner: Address,
        /// Value still locked.
        amount_locked: Amount,
    },

    /// Value arithmetic overflowed.
    #[error("Value overflow")]
    Overflow,

    /// Outbound value transfer failed; the released value was restored.
    #[error("Transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        /// Recipient of the transfer.
        to: Address,
        /// Amount that was being transferred.
        amount: Amount,
        /// Reason reported by the transfer backend.
        reason: String,
    },

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid ledger configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EscrowError {
    /// Short stable label, used for log fields and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::NoEnvelopesForKey { .. } => "no_envelopes_for_key",
            Self::NothingEligibleYet { .. } => "nothing_eligible_yet",
            Self::TooEarly { .. } => "too_early",
            Self::NoBalance { .. } => "no_balance",
            Self::ZeroAmount => "zero_amount",
            Self::LockOccupied { .. } => "lock_occupied",
            Self::Overflow => "overflow",
            Self::TransferFailed { .. } => "transfer_failed",
            Self::Storage(_) => "storage",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Errors reported by the outbound value-transfer port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Recipient refused the value.
    #[error("recipient {0} rejected the transfer")]
    Rejected(Address),

    /// Transfer backend could not be reached.
    #[error("transfer backend unavailable: {0}")]
    Unavailable(String),
}
