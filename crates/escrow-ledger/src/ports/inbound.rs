//! # Driving Ports (API - Inbound)
//!
//! Public operations of the two ledger variants.

use crate::domain::{Address, Amount, Envelope, EscrowError, Timestamp};
use async_trait::async_trait;

/// Multi-envelope ledger: bounded envelope sequences per (depositor, payee).
#[async_trait]
pub trait EnvelopeLedgerApi: Send + Sync {
    /// Lock `amount` for `payee` until `unlock_time`.
    ///
    /// # Errors
    ///
    /// * `ZeroAmount` - `amount` is zero
    /// * `CapacityExceeded` - the pair already holds the maximum envelopes
    async fn deposit(
        &self,
        depositor: Address,
        unlock_time: Timestamp,
        payee: Address,
        amount: Amount,
    ) -> Result<Envelope, EscrowError>;

    /// Envelopes of the pair, oldest first. Empty if none.
    async fn get_deposit_envelopes(
        &self,
        depositor: Address,
        payee: Address,
    ) -> Result<Vec<Envelope>, EscrowError>;

    /// Release every eligible envelope of the pair to `payee`.
    ///
    /// Returns the amount transferred.
    ///
    /// # Errors
    ///
    /// * `NoEnvelopesForKey` - the pair never received a deposit
    /// * `NothingEligibleYet` - no envelope has reached its unlock time
    /// * `TransferFailed` - the transfer failed and the release was rolled back
    async fn disburse(&self, depositor: Address, payee: Address) -> Result<Amount, EscrowError>;

    /// Amount `disburse` would release right now.
    async fn disbursable_amount(
        &self,
        depositor: Address,
        payee: Address,
    ) -> Result<Amount, EscrowError>;
}

/// Single-lock ledger: one lock per beneficiary.
#[async_trait]
pub trait SingleLockApi: Send + Sync {
    /// Lock `amount` for `beneficiary` until `unlock_time`.
    ///
    /// # Errors
    ///
    /// * `ZeroAmount` - `amount` is zero
    /// * `LockOccupied` - the beneficiary holds a lock and overwrites are rejected
    async fn deposit(
        &self,
        depositor: Address,
        unlock_time: Timestamp,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<Envelope, EscrowError>;

    /// Lock held by `owner`, if any.
    async fn lock_info(&self, owner: Address) -> Result<Option<Envelope>, EscrowError>;

    /// Lock held by `owner`, or a zero envelope if none.
    async fn get_lock_info(&self, owner: Address) -> Result<Envelope, EscrowError> {
        Ok(self.lock_info(owner).await?.unwrap_or_default())
    }

    /// Withdraw `amount` from the caller's own lock.
    ///
    /// # Errors
    ///
    /// * `NoBalance` - no lock for the caller, or `amount` exceeds it
    /// * `TooEarly` - the lock has not reached its unlock time
    /// * `TransferFailed` - the transfer failed and the withdrawal was rolled back
    async fn withdraw(&self, caller: Address, amount: Amount) -> Result<Amount, EscrowError>;
}
