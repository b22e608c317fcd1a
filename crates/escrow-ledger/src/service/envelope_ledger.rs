//! # Multi-Envelope Ledger
//!
//! Each (depositor, payee) pair holds a bounded, deposit-ordered sequence of
//! envelopes. `disburse` sweeps every eligible envelope of the pair into a
//! single transfer to the payee.

use super::locks::{InFlight, KeyLocks};
use super::{metrics, note_failure, Books, LedgerStats};
use crate::config::LedgerConfig;
use crate::domain::{
    invariant_capacity, invariant_conservation, invariant_positive_amount, Address, Amount,
    Custody, Envelope, EnvelopeKey, EnvelopeSlot, EscrowError, InvariantViolation, Timestamp,
};
use crate::ports::inbound::EnvelopeLedgerApi;
use crate::ports::outbound::{EnvelopeStore, TimeSource, ValueTransfer};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

const LEDGER: &str = "envelope";

/// Multi-envelope escrow ledger.
pub struct EnvelopeLedger<S: EnvelopeStore> {
    config: LedgerConfig,
    store: Arc<S>,
    transfer: Arc<dyn ValueTransfer>,
    clock: Arc<dyn TimeSource>,
    key_locks: KeyLocks<EnvelopeKey>,
    in_flight: InFlight<EnvelopeKey>,
    books: Mutex<Books>,
}

impl<S: EnvelopeStore> EnvelopeLedger<S> {
    /// Open a ledger over `store`.
    ///
    /// Custody is seeded from the value already stored, so a ledger reopened
    /// over restored storage starts conserved.
    pub async fn open(
        config: LedgerConfig,
        store: Arc<S>,
        transfer: Arc<dyn ValueTransfer>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, EscrowError> {
        config.validate()?;
        let held = store.total_locked().await?;

        info!(
            capacity = config.max_envelopes_per_key,
            held, "Envelope ledger opened"
        );

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

    /// Sum of every stored envelope.
    pub async fn total_locked(&self) -> Result<Amount, EscrowError> {
        self.store.total_locked().await
    }

    /// Compare custody against stored value.
    ///
    /// Only meaningful while no call is between its effects and its
    /// transfer on another task. Returns the violation, if any.
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
        key: EnvelopeKey,
        unlock_time: Timestamp,
        amount: Amount,
    ) -> Result<Envelope, EscrowError> {
        invariant_positive_amount(amount)?;

        let _guard = self.key_locks.lock(key).await;
        let mut sequence = self.store.load_sequence(&key).await?.unwrap_or_default();

        // Released envelopes may come back, so they still occupy a slot.
        let occupied = sequence.len() + self.in_flight.get(&key).envelopes;
        invariant_capacity(key, occupied, self.config.max_envelopes_per_key)?;

        let envelope = Envelope::new(amount, unlock_time);
        let slot = sequence.append(envelope);

        self.books.lock().custody.credit(amount)?;
        if let Err(e) = self.store.save_sequence(key, sequence).await {
            self.books.lock().custody.debit(amount);
            return Err(e);
        }

        let custody = {
            let mut books = self.books.lock();
            books.stats.deposits_accepted += 1;
            books.custody
        };
        metrics::record_deposit(LEDGER);
        metrics::record_custody(LEDGER, &custody);

        info!(
            key = %key,
            seq = slot.seq,
            amount,
            unlock_time,
            "Envelope deposited"
        );
        Ok(envelope)
    }

    async fn try_disburse(&self, key: EnvelopeKey) -> Result<Amount, EscrowError> {
        let (released, amount) = {
            let _guard = self.key_locks.lock(key).await;
            let mut sequence = self
                .store
                .load_sequence(&key)
                .await?
                .ok_or(EscrowError::NoEnvelopesForKey { key })?;

            let now = self.clock.now();
            let sweep = sequence.sweep(now)?;
            debug!(
                key = %key,
                now,
                eligible = sweep.count(),
                retained = sequence.len(),
                "Eligibility partition computed"
            );

            if sweep.is_empty() {
                return Err(EscrowError::NothingEligibleYet {
                    key,
                    next_unlock: sequence.next_unlock(),
                });
            }

            self.store.save_sequence(key, sequence).await?;
            self.in_flight.reserve(key, sweep.count(), sweep.amount);
            self.books.lock().custody.release(sweep.amount);
            (sweep.released, sweep.amount)
        };

        let envelopes = released.len();
        if let Err(transfer_err) = self.transfer.transfer(key.payee, amount).await {
            if let Err(restore_err) = self.restore(key, released, amount).await {
                self.strand(key, envelopes, amount);
                error!(
                    key = %key,
                    envelopes,
                    amount,
                    transfer_error = %transfer_err,
                    error = %restore_err,
                    "Rollback after failed transfer not stored, value stranded"
                );
                return Err(restore_err);
            }
            return Err(EscrowError::TransferFailed {
                to: key.payee,
                amount,
                reason: transfer_err.to_string(),
            });
        }

        self.in_flight.clear(&key, envelopes, amount);
        let custody = {
            let mut books = self.books.lock();
            books.custody.settle(amount);
            books.stats.disbursements += 1;
            books.stats.envelopes_released += envelopes as u64;
            books.stats.total_released = books.stats.total_released.saturating_add(amount);
            books.custody
        };
        metrics::record_disbursement(envelopes, amount);
        metrics::record_custody(LEDGER, &custody);

        info!(key = %key, envelopes, amount, "Envelopes disbursed");
        Ok(amount)
    }

    /// Put released envelopes back after a failed transfer.
    async fn restore(
        &self,
        key: EnvelopeKey,
        released: Vec<EnvelopeSlot>,
        amount: Amount,
    ) -> Result<(), EscrowError> {
        let envelopes = released.len();
        let _guard = self.key_locks.lock(key).await;

        let mut sequence = self.store.load_sequence(&key).await?.unwrap_or_default();
        sequence.restore(released);
        self.store.save_sequence(key, sequence).await?;

        self.in_flight.clear(&key, envelopes, amount);
        self.books.lock().custody.revert(amount);
        debug!(key = %key, envelopes, amount, "Released envelopes restored");
        Ok(())
    }

    /// Drop the reservation of envelopes that could not be restored.
    fn strand(&self, key: EnvelopeKey, envelopes: usize, amount: Amount) {
        self.in_flight.clear(&key, envelopes, amount);
        let custody = {
            let mut books = self.books.lock();
            books.custody.strand(amount);
            books.custody
        };
        metrics::record_custody(LEDGER, &custody);
    }
}

#[async_trait]
impl<S: EnvelopeStore> EnvelopeLedgerApi for EnvelopeLedger<S> {
    #[instrument(skip(self, depositor, payee), fields(depositor = %depositor, payee = %payee))]
    async fn deposit(
        &self,
        depositor: Address,
        unlock_time: Timestamp,
        payee: Address,
        amount: Amount,
    ) -> Result<Envelope, EscrowError> {
        self.try_deposit(EnvelopeKey::new(depositor, payee), unlock_time, amount)
            .await
            .map_err(|e| note_failure(&self.books, LEDGER, "deposit", e))
    }

    async fn get_deposit_envelopes(
        &self,
        depositor: Address,
        payee: Address,
    ) -> Result<Vec<Envelope>, EscrowError> {
        let key = EnvelopeKey::new(depositor, payee);
        Ok(self
            .store
            .load_sequence(&key)
            .await?
            .map(|sequence| sequence.envelopes())
            .unwrap_or_default())
    }

    #[instrument(skip(self, depositor, payee), fields(depositor = %depositor, payee = %payee))]
    async fn disburse(&self, depositor: Address, payee: Address) -> Result<Amount, EscrowError> {
        self.try_disburse(EnvelopeKey::new(depositor, payee))
            .await
            .map_err(|e| note_failure(&self.books, LEDGER, "disburse", e))
    }

    async fn disbursable_amount(
        &self,
        depositor: Address,
        payee: Address,
    ) -> Result<Amount, EscrowError> {
        let key = EnvelopeKey::new(depositor, payee);
        match self.store.load_sequence(&key).await? {
            Some(sequence) => sequence.eligible_amount(self.clock.now()),
            None => Ok(0),
        }
    }
}
