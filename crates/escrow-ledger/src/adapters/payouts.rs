//! # Payout Book
//!
//! Recording `ValueTransfer` adapter. Credits every transfer to an
//! in-memory balance per recipient, with failure injection for tests.

use crate::domain::{Address, Amount, TransferError};
use crate::ports::outbound::ValueTransfer;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// In-memory payout book.
#[derive(Debug, Default)]
pub struct InMemoryPayouts {
    balances: RwLock<HashMap<Address, Amount>>,
    rejecting: RwLock<HashSet<Address>>,
    offline: RwLock<bool>,
}

impl InMemoryPayouts {
    /// Create an empty payout book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value received by `recipient`.
    #[must_use]
    pub fn balance_of(&self, recipient: &Address) -> Amount {
        self.balances.read().get(recipient).copied().unwrap_or(0)
    }

    /// Total value paid out to everyone.
    #[must_use]
    pub fn total_paid(&self) -> Amount {
        self.balances.read().values().sum()
    }

    /// Make transfers to `recipient` fail.
    pub fn reject(&self, recipient: Address) {
        self.rejecting.write().insert(recipient);
    }

    /// Let transfers to `recipient` succeed again.
    pub fn accept(&self, recipient: &Address) {
        self.rejecting.write().remove(recipient);
    }

    /// Simulate the transfer backend going down (or coming back).
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }
}

#[async_trait]
impl ValueTransfer for InMemoryPayouts {
    async fn transfer(&self, to: Address, amount: Amount) -> Result<(), TransferError> {
        if *self.offline.read() {
            return Err(TransferError::Unavailable("payout book offline".to_string()));
        }
        if self.rejecting.read().contains(&to) {
            return Err(TransferError::Rejected(to));
        }

        let mut balances = self.balances.write();
        let balance = balances.entry(to).or_insert(0);
        *balance = balance.saturating_add(amount);
        debug!(recipient = %to, amount, "Payout credited");
        Ok(())
    }
}
