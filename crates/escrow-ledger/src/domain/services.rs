//! # Domain Services
//!
//! Pure functions behind the eligibility sweep. No I/O, no clocks: the
//! current time is always passed in.

use super::entities::EnvelopeSlot;
use super::errors::EscrowError;
use super::value_objects::{Amount, Timestamp};

/// Split slots into (eligible, ineligible) at `now`, preserving relative
/// order within each partition.
#[must_use]
pub fn partition_eligible(
    slots: &[EnvelopeSlot],
    now: Timestamp,
) -> (Vec<EnvelopeSlot>, Vec<EnvelopeSlot>) {
    slots
        .iter()
        .partition(|slot| slot.envelope.is_eligible(now))
}

/// Checked sum of the locked amounts.
pub fn sum_locked(slots: &[EnvelopeSlot]) -> Result<Amount, EscrowError> {
    slots.iter().try_fold(0 as Amount, |acc, slot| {
        acc.checked_add(slot.envelope.amount_locked)
            .ok_or(EscrowError::Overflow)
    })
}

/// Merge two slot lists that are each sorted by sequence number.
#[must_use]
pub fn merge_by_sequence(left: Vec<EnvelopeSlot>, right: Vec<EnvelopeSlot>) -> Vec<EnvelopeSlot> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.seq <= r.seq,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged
}
