//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the ledger depends on. Adapters implement these traits to
//! provide:
//! - Keyed storage for envelopes and single locks
//! - The outbound value-transfer primitive
//! - The current time

use crate::domain::{
    Address, Amount, Envelope, EnvelopeKey, EnvelopeSequence, EscrowError, Timestamp,
    TransferError,
};
use async_trait::async_trait;

// =============================================================================
// STORAGE
// =============================================================================

/// Keyed storage of the multi-envelope ledger.
///
/// A key that has ever received a deposit stays present, even with an
/// empty sequence; absence means "never deposited".
#[async_trait]
pub trait EnvelopeStore: Send + Sync {
    /// Load the sequence stored under `key`.
    async fn load_sequence(
        &self,
        key: &EnvelopeKey,
    ) -> Result<Option<EnvelopeSequence>, EscrowError>;

    /// Replace the sequence stored under `key`.
    async fn save_sequence(
        &self,
        key: EnvelopeKey,
        sequence: EnvelopeSequence,
    ) -> Result<(), EscrowError>;

    /// All keys that have received a deposit.
    async fn keys(&self) -> Result<Vec<EnvelopeKey>, EscrowError>;

    /// Sum of all stored envelopes.
    async fn total_locked(&self) -> Result<Amount, EscrowError> {
        let mut total: Amount = 0;
        for key in self.keys().await? {
            if let Some(sequence) = self.load_sequence(&key).await? {
                total = total
                    .checked_add(sequence.total_locked()?)
                    .ok_or(EscrowError::Overflow)?;
            }
        }
        Ok(total)
    }
}

/// Keyed storage of the single-lock ledger: at most one envelope per owner.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Load the lock held by `owner`.
    async fn load_lock(&self, owner: &Address) -> Result<Option<Envelope>, EscrowError>;

    /// Store (or replace) the lock held by `owner`.
    async fn save_lock(&self, owner: Address, envelope: Envelope) -> Result<(), EscrowError>;

    /// Remove the lock held by `owner`.
    async fn remove_lock(&self, owner: &Address) -> Result<(), EscrowError>;

    /// All owners currently holding a lock.
    async fn owners(&self) -> Result<Vec<Address>, EscrowError>;

    /// Sum of all stored locks.
    async fn total_locked(&self) -> Result<Amount, EscrowError> {
        let mut total: Amount = 0;
        for owner in self.owners().await? {
            if let Some(envelope) = self.load_lock(&owner).await? {
                total = total
                    .checked_add(envelope.amount_locked)
                    .ok_or(EscrowError::Overflow)?;
            }
        }
        Ok(total)
    }
}

// =============================================================================
// VALUE TRANSFER
// =============================================================================

/// Outbound value transfer.
///
/// Implementations may call back into the ledger before returning. The
/// ledger commits all bookkeeping before calling [`ValueTransfer::transfer`].
#[async_trait]
pub trait ValueTransfer: Send + Sync {
    /// Move `amount` out of escrow to `to`.
    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError>;
}

// =============================================================================
// TIME
// =============================================================================

/// Source of the current timestamp, sampled when a call executes.
pub trait TimeSource: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}
