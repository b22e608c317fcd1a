//! # Ledger Services
//!
//! The two ledger variants, wired to the outbound ports.
//!
//! ## Call Discipline
//!
//! Every mutating call runs in three steps:
//!
//! 1. **Checks and effects** under the per-key lock: validate, update
//!    storage, move the released value into the in-flight bucket.
//! 2. **Interaction** with the lock released: the outbound transfer. A
//!    transfer that re-enters the ledger sees the committed state.
//! 3. **Compensation** under the per-key lock again, only if the transfer
//!    failed: released value goes back exactly where it was.

mod envelope_ledger;
mod locks;
mod metrics;
mod single_lock;

pub use envelope_ledger::EnvelopeLedger;
pub use single_lock::SingleLockLedger;

use crate::domain::{Amount, Custody, EscrowError};
use parking_lot::Mutex;
use tracing::{error, warn};

/// Statistics for a ledger service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Deposits accepted.
    pub deposits_accepted: u64,
    /// Successful multi-envelope disbursements.
    pub disbursements: u64,
    /// Envelopes released by those disbursements.
    pub envelopes_released: u64,
    /// Successful single-lock withdrawals.
    pub withdrawals: u64,
    /// Calls rejected by a check (capacity, eligibility, balance, ...).
    pub rejected_calls: u64,
    /// Outbound transfers that failed and were rolled back.
    pub failed_transfers: u64,
    /// Total value transferred out of escrow.
    pub total_released: Amount,
    /// Value currently backing stored envelopes.
    pub value_held: Amount,
    /// Value whose transfer is still pending.
    pub value_in_flight: Amount,
    /// Value discarded by single-lock overwrites or stranded by a failed rollback.
    pub value_orphaned: Amount,
}

/// Custody plus counters, guarded together.
#[derive(Debug, Default)]
pub(crate) struct Books {
    pub custody: Custody,
    pub stats: LedgerStats,
}

impl Books {
    fn with_held(held: Amount) -> Self {
        Self {
            custody: Custody::with_held(held),
            stats: LedgerStats::default(),
        }
    }

    fn snapshot(&self) -> LedgerStats {
        LedgerStats {
            value_held: self.custody.held,
            value_in_flight: self.custody.in_flight,
            value_orphaned: self.custody.orphaned,
            ..self.stats.clone()
        }
    }
}

/// Log and count a failed call, passing the error through.
fn note_failure(
    books: &Mutex<Books>,
    ledger: &'static str,
    operation: &'static str,
    err: EscrowError,
) -> EscrowError {
    match &err {
        EscrowError::TransferFailed { to, amount, reason } => {
            error!(ledger, operation, to = %to, amount, reason = %reason, "Transfer failed, release rolled back");
            books.lock().stats.failed_transfers += 1;
            metrics::record_transfer_failure(ledger);
        }
        other => {
            warn!(ledger, operation, kind = other.kind(), error = %other, "Operation rejected");
            books.lock().stats.rejected_calls += 1;
            metrics::record_rejection(operation, other.kind());
        }
    }
    err
}
