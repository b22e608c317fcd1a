//! # Domain Entities
//!
//! Core data structures of the envelope accounting engine.
//!
//! ## Lifecycle
//!
//! An envelope is created only by a successful deposit and destroyed only by
//! a successful disbursement (or single-lock withdrawal). Stored envelopes
//! always carry a positive amount; a released envelope is removed, never
//! zeroed in place.

use super::errors::EscrowError;
use super::services::{merge_by_sequence, partition_eligible, sum_locked};
use super::value_objects::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Default number of envelopes one (depositor, payee) pair may hold.
pub const MAX_ENVELOPES_PER_KEY: usize = 10;

/// A single locked-value record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Value locked in the envelope.
    pub amount_locked: Amount,
    /// Unlock timestamp. Eligible for release once `now >= locked_until`.
    pub locked_until: Timestamp,
}

impl Envelope {
    /// Create a new envelope.
    #[must_use]
    pub const fn new(amount_locked: Amount, locked_until: Timestamp) -> Self {
        Self {
            amount_locked,
            locked_until,
        }
    }

    /// Check whether the envelope may be released at `now`.
    #[must_use]
    pub fn is_eligible(&self, now: Timestamp) -> bool {
        now >= self.locked_until
    }
}

/// An envelope tagged with its per-key deposit sequence number.
///
/// Sequence numbers grow monotonically per key, so ascending sequence order
/// is deposit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeSlot {
    /// Deposit sequence number within the key.
    pub seq: u64,
    /// The envelope itself.
    pub envelope: Envelope,
}

/// Result of sweeping a sequence for eligible envelopes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Envelopes removed from the sequence, in deposit order.
    pub released: Vec<EnvelopeSlot>,
    /// Sum of the released amounts.
    pub amount: Amount,
}

impl Sweep {
    /// Number of envelopes released.
    #[must_use]
    pub fn count(&self) -> usize {
        self.released.len()
    }

    /// True if nothing was eligible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.released.is_empty()
    }
}

/// Ordered envelope list of one (depositor, payee) key, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeSequence {
    slots: Vec<EnvelopeSlot>,
    next_seq: u64,
}

impl EnvelopeSequence {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a sequence from stored slots (e.g. a snapshot).
    #[must_use]
    pub fn from_slots(mut slots: Vec<EnvelopeSlot>) -> Self {
        slots.sort_by_key(|slot| slot.seq);
        let next_seq = slots.last().map_or(0, |slot| slot.seq + 1);
        Self { slots, next_seq }
    }

    /// Number of stored envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no envelope is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stored slots in deposit order.
    #[must_use]
    pub fn slots(&self) -> &[EnvelopeSlot] {
        &self.slots
    }

    /// Sequence number the next appended envelope receives.
    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Stored envelopes in deposit order.
    #[must_use]
    pub fn envelopes(&self) -> Vec<Envelope> {
        self.slots.iter().map(|slot| slot.envelope).collect()
    }

    /// Sum of all stored amounts.
    pub fn total_locked(&self) -> Result<Amount, EscrowError> {
        sum_locked(&self.slots)
    }

    /// Earliest unlock time among the stored envelopes.
    #[must_use]
    pub fn next_unlock(&self) -> Option<Timestamp> {
        self.slots.iter().map(|slot| slot.envelope.locked_until).min()
    }

    /// Sum of the envelopes that are eligible at `now`, without removing them.
    pub fn eligible_amount(&self, now: Timestamp) -> Result<Amount, EscrowError> {
        let (eligible, _) = partition_eligible(&self.slots, now);
        sum_locked(&eligible)
    }

    /// Append a new envelope at the tail. Capacity is checked by the caller.
    pub fn append(&mut self, envelope: Envelope) -> EnvelopeSlot {
        let slot = EnvelopeSlot {
            seq: self.next_seq,
            envelope,
        };
        self.next_seq += 1;
        self.slots.push(slot);
        slot
    }

    /// Remove every envelope eligible at `now`.
    ///
    /// Ineligible envelopes stay in their original relative order. On error
    /// the sequence is left untouched.
    pub fn sweep(&mut self, now: Timestamp) -> Result<Sweep, EscrowError> {
        let (released, retained) = partition_eligible(&self.slots, now);
        let amount = sum_locked(&released)?;
        self.slots = retained;
        Ok(Sweep { released, amount })
    }

    /// Put released envelopes back at their original positions.
    pub fn restore(&mut self, released: Vec<EnvelopeSlot>) {
        let current = std::mem::take(&mut self.slots);
        self.slots = merge_by_sequence(current, released);
    }
}

/// Value the ledger holds on behalf of depositors.
///
/// `held` always equals the sum of the stored envelopes. Value whose
/// outbound transfer has not yet returned sits in `in_flight`. Value
/// discarded by a single-lock overwrite moves to `orphaned`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Custody {
    /// Value backing stored envelopes.
    pub held: Amount,
    /// Value removed from storage, transfer pending.
    pub in_flight: Amount,
    /// Value no longer backed by any envelope.
    pub orphaned: Amount,
}

impl Custody {
    /// Custody seeded with value already present in storage.
    #[must_use]
    pub fn with_held(held: Amount) -> Self {
        Self {
            held,
            ..Self::default()
        }
    }

    /// Book newly deposited value.
    pub fn credit(&mut self, amount: Amount) -> Result<(), EscrowError> {
        self.held = self.held.checked_add(amount).ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    /// Undo a credit whose storage write failed.
    pub fn debit(&mut self, amount: Amount) {
        self.held = self.held.saturating_sub(amount);
    }

    /// Move value from storage into the pending-transfer bucket.
    pub fn release(&mut self, amount: Amount) {
        self.held = self.held.saturating_sub(amount);
        self.in_flight = self.in_flight.saturating_add(amount);
    }

    /// The transfer went through; the value has left the ledger.
    pub fn settle(&mut self, amount: Amount) {
        self.in_flight = self.in_flight.saturating_sub(amount);
    }

    /// The transfer failed; the value is back in storage.
    pub fn revert(&mut self, amount: Amount) {
        self.in_flight = self.in_flight.saturating_sub(amount);
        self.held = self.held.saturating_add(amount);
    }

    /// Value of a discarded lock stays in custody but backs no envelope.
    pub fn orphan(&mut self, amount: Amount) {
        self.held = self.held.saturating_sub(amount);
        self.orphaned = self.orphaned.saturating_add(amount);
    }

    /// The transfer failed and the value could not be stored again.
    pub fn strand(&mut self, amount: Amount) {
        self.in_flight = self.in_flight.saturating_sub(amount);
        self.orphaned = self.orphaned.saturating_add(amount);
    }
}
