//! # Escrow Ledger
//!
//! Envelope accounting engine for time-locked value escrow.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Hold value on behalf of depositors and release it to designated
//! recipients once an unlock time has passed:
//! - Multi-envelope ledger: up to N envelopes per (depositor, payee), swept
//!   together by `disburse`
//! - Single-lock ledger: one lock per beneficiary, withdrawn by the
//!   beneficiary after the unlock time
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Conservation | custody `held` == sum of stored envelopes |
//! | No double release | envelopes leave storage before the transfer starts |
//! | Capacity | stored + in-flight envelopes per key <= `max_envelopes_per_key` |
//! | Order | surviving envelopes keep deposit order |
//! | Eligibility | released iff `now >= locked_until` |
//! | Atomicity | a failed transfer restores the released value |
//!
//! ## Module Structure
//!
//! ```text
//! escrow-ledger/
//! ├── domain/          # Envelope, EnvelopeSequence, Custody, errors, snapshots
//! ├── ports/           # EnvelopeLedgerApi, SingleLockApi, stores, ValueTransfer
//! ├── adapters/        # In-memory stores, clocks, payout book
//! ├── service/         # EnvelopeLedger, SingleLockLedger
//! └── config.rs        # LedgerConfig
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use escrow_ledger::prelude::*;
//!
//! let ledger = EnvelopeLedger::open(
//!     LedgerConfig::from_env(),
//!     Arc::new(InMemoryEnvelopeStore::new()),
//!     Arc::new(InMemoryPayouts::new()),
//!     Arc::new(SystemClock),
//! )
//! .await?;
//!
//! ledger.deposit(depositor, unlock_time, payee, 1_000).await?;
//! let released = ledger.disburse(depositor, payee).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    capture_snapshot, restore_snapshot, InMemoryEnvelopeStore, InMemoryLockStore,
    InMemoryPayouts, ManualClock, SystemClock,
};
pub use config::LedgerConfig;
pub use domain::{
    Address, Amount, Custody, Envelope, EnvelopeKey, EnvelopeSequence, EscrowError,
    InvariantViolation, LedgerSnapshot, OverwritePolicy, Timestamp, TransferError,
    MAX_ENVELOPES_PER_KEY,
};
pub use ports::{
    EnvelopeLedgerApi, EnvelopeStore, LockStore, SingleLockApi, TimeSource, ValueTransfer,
};
pub use service::{EnvelopeLedger, LedgerStats, SingleLockLedger};

/// Everything needed to wire up a ledger.
pub mod prelude {
    pub use crate::adapters::{
        InMemoryEnvelopeStore, InMemoryLockStore, InMemoryPayouts, ManualClock, SystemClock,
    };
    pub use crate::config::LedgerConfig;
    pub use crate::domain::{
        Address, Amount, Envelope, EscrowError, OverwritePolicy, Timestamp,
    };
    pub use crate::ports::{EnvelopeLedgerApi, SingleLockApi, TimeSource, ValueTransfer};
    pub use crate::service::{EnvelopeLedger, LedgerStats, SingleLockLedger};
    pub use std::sync::Arc;
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
