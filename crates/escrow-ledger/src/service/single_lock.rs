//! # Single-Lock Ledger
//!
//! One lock per beneficiary. Anyone may fund a lock for someone else
//! (delegation); only the beneficiary may withdraw, and only after the
//! unlock time.

use super::locks::{InFlight, KeyLocks};
use super::{metrics, note_failure, Books, LedgerStats};
use crate::config::LedgerConfig;
use crate::domain::{
    invariant_conservation, invariant_positive_amount, Address, Amount, Custody, Envelope,
    EscrowError, InvariantViolation, OverwritePolicy, Timestamp,
};
use crate::ports::inbound::SingleLockApi;
use crate::ports::outbound::{LockStore, TimeSource, ValueTransfer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const LEDGER: &str = "single_lock";

/// Single-lock escrow ledger.
pub struct SingleLockLedger<S: LockStore> {
    config: LedgerConfig,
    store: Arc<S>,
    transfer: Arc<dyn ValueTransfer>,
    clock: Arc<dyn TimeSource>,
    key_locks: KeyLocks<Address>,
    in_flight: InFlight<Address>,
    books: Mutex<Books>,
}

impl<S: LockStore> SingleLockLedger<S> {
    /// Open a ledger over `store`, seeding custody from the stored locks.
    pub async fn open(
        config: LedgerConfig,
        store: Arc<S>,
        transfer: Arc<dyn ValueTransfer>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, EscrowError> {
        config.validate()?;
        let held = store.total_locked().await?;

        info!(policy = ?config.overwrite_policy, held, "Single-lock ledger opened");

        Ok(Self {
            config,
            store,
            transfer,
            clock,
            key_locks: KeyLocks::new(),
            in_flight: InFlight::new(),
            books: Mutex::new(Books::with_held(held)),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get current ledger statistics.
    pub fn stats(&self) -> LedgerStats {
        self.books.lock().snapshot()
    }

    /// Current custody buckets.
    pub fn custody(&self) -> Custody {
        self.books.lock().custody
    }

    /// Sum of every stored lock.
    pub async fn total_locked(&self) -> Result<Amount, EscrowError> {
        self.store.total_locked().await
    }

    /// Compare custody against stored value. See
    /// [`EnvelopeLedger::check_conservation`](super::EnvelopeLedger::check_conservation).
    pub async fn check_conservation(&self) -> Result<Option<InvariantViolation>, EscrowError> {
        let stored = self.store.total_locked().await?;
        let held = self.books.lock().custody.held;
        match invariant_conservation(held, stored) {
            Ok(()) => Ok(None),
            Err(violation) => {
                error!(%violation, "Conservation check failed");
                Ok(Some(violation))
            }
        }
    }

    async fn try_deposit(
        &self,
        depositor: Address,
        unlock_time: Timestamp,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<Envelope, EscrowError> {
        invariant_positive_amount(amount)?;

        let _guard = self.key_locks.lock(beneficiary).await;
        let existing = self.store.load_lock(&beneficiary).await?;
        let pending = self.in_flight.get(&beneficiary).amount;

        if self.config.overwrite_policy == OverwritePolicy::Reject {
            if let Some(current) = existing {
                return Err(EscrowError::LockOccupied {
                    owner: beneficiary,
                    amount_locked: current.amount_locked,
                });
            }
            // A pending withdrawal may still be restored into this slot.
            if pending > 0 {
                return Err(EscrowError::LockOccupied {
                    owner: beneficiary,
                    amount_locked: pending,
                });
            }
        }

        let envelope = Envelope::new(amount, unlock_time);
        self.books.lock().custody.credit(amount)?;
        if let Err(e) = self.store.save_lock(beneficiary, envelope).await {
            self.books.lock().custody.debit(amount);
            return Err(e);
        }

        let custody = {
            let mut books = self.books.lock();
            if let Some(discarded) = existing {
                books.custody.orphan(discarded.amount_locked);
            }
            books.stats.deposits_accepted += 1;
            books.custody
        };
        if let Some(discarded) = existing {
            warn!(
                beneficiary = %beneficiary,
                orphaned = discarded.amount_locked,
                "Existing lock overwritten"
            );
        }
        metrics::record_deposit(LEDGER);
        metrics::record_custody(LEDGER, &custody);

        info!(
            depositor = %depositor,
            beneficiary = %beneficiary,
            amount,
            unlock_time,
            "Lock deposited"
        );
        Ok(envelope)
    }

    async fn try_withdraw(&self, caller: Address, amount: Amount) -> Result<Amount, EscrowError> {
        invariant_positive_amount(amount)?;

        let original = {
            let _guard = self.key_locks.lock(caller).await;
            let lock = self
                .store
                .load_lock(&caller)
                .await?
                .ok_or(EscrowError::NoBalance { owner: caller })?;

            let now = self.clock.now();
            if !lock.is_eligible(now) {
                return Err(EscrowError::TooEarly {
                    locked_until: lock.locked_until,
                    now,
                });
            }
            if amount > lock.amount_locked {
                return Err(EscrowError::NoBalance { owner: caller });
            }

            let remaining = lock.amount_locked - amount;
            if remaining == 0 {
                self.store.remove_lock(&caller).await?;
            } else {
                self.store
                    .save_lock(caller, Envelope::new(remaining, lock.locked_until))
                    .await?;
            }
            self.in_flight.reserve(caller, 0, amount);
            self.books.lock().custody.release(amount);
            lock
        };

        if let Err(transfer_err) = self.transfer.transfer(caller, amount).await {
            if let Err(restore_err) = self.restore(caller, original, amount).await {
                self.strand(caller, amount);
                error!(
                    owner = %caller,
                    amount,
                    transfer_error = %transfer_err,
                    error = %restore_err,
                    "Rollback after failed transfer not stored, value stranded"
                );
                return Err(restore_err);
            }
            return Err(EscrowError::TransferFailed {
                to: caller,
                amount,
                reason: transfer_err.to_string(),
            });
        }

        self.in_flight.clear(&caller, 0, amount);
        let custody = {
            let mut books = self.books.lock();
            books.custody.settle(amount);
            books.stats.withdrawals += 1;
            books.stats.total_released = books.stats.total_released.saturating_add(amount);
            books.custody
        };
        metrics::record_withdrawal(amount);
        metrics::record_custody(LEDGER, &custody);

        info!(owner = %caller, amount, "Lock withdrawn");
        Ok(amount)
    }

    /// Give a withdrawn amount back to its lock after a failed transfer.
    async fn restore(
        &self,
        owner: Address,
        original: Envelope,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        let _guard = self.key_locks.lock(owner).await;

        let restored = match self.store.load_lock(&owner).await? {
            Some(current) => Envelope::new(
                current
                    .amount_locked
                    .checked_add(amount)
                    .ok_or(EscrowError::Overflow)?,
                current.locked_until,
            ),
            None => Envelope::new(amount, original.locked_until),
        };
        self.store.save_lock(owner, restored).await?;

        self.in_flight.clear(&owner, 0, amount);
        self.books.lock().custody.revert(amount);
        debug!(owner = %owner, amount, "Withdrawal restored");
        Ok(())
    }

    fn strand(&self, owner: Address, amount: Amount) {
        self.in_flight.clear(&owner, 0, amount);
        let custody = {
            let mut books = self.books.lock();
            books.custody.strand(amount);
            books.custody
        };
        metrics::record_custody(LEDGER, &custody);
    }
}

#[async_trait]
impl<S: LockStore> SingleLockApi for SingleLockLedger<S> {
    #[instrument(skip(self, depositor, beneficiary), fields(depositor = %depositor, beneficiary = %beneficiary))]
    async fn deposit(
        &self,
        depositor: Address,
        unlock_time: Timestamp,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<Envelope, EscrowError> {
        self.try_deposit(depositor, unlock_time, beneficiary, amount)
            .await
            .map_err(|e| note_failure(&self.books, LEDGER, "deposit", e))
    }

    async fn lock_info(&self, owner: Address) -> Result<Option<Envelope>, EscrowError> {
        self.store.load_lock(&owner).await
    }

    #[instrument(skip(self, caller), fields(caller = %caller))]
    async fn withdraw(&self, caller: Address, amount: Amount) -> Result<Amount, EscrowError> {
        self.try_withdraw(caller, amount)
            .await
            .map_err(|e| note_failure(&self.books, LEDGER, "withdraw", e))
    }
}
