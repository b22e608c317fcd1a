//! # In-Memory Stores
//!
//! `HashMap`-backed implementations of the storage ports, with snapshot
//! export and import.

use crate::domain::{
    Address, Envelope, EnvelopeKey, EnvelopeSequence, EscrowError, LedgerSnapshot,
};
use crate::ports::outbound::{EnvelopeStore, LockStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory multi-envelope storage.
#[derive(Debug, Default)]
pub struct InMemoryEnvelopeStore {
    sequences: RwLock<HashMap<EnvelopeKey, EnvelopeSequence>>,
}

impl InMemoryEnvelopeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from snapshot entries.
    #[must_use]
    pub fn from_entries(entries: Vec<(EnvelopeKey, EnvelopeSequence)>) -> Self {
        Self {
            sequences: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Copy of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(EnvelopeKey, EnvelopeSequence)> {
        self.sequences
            .read()
            .iter()
            .map(|(key, seq)| (*key, seq.clone()))
            .collect()
    }
}

#[async_trait]
impl EnvelopeStore for InMemoryEnvelopeStore {
    async fn load_sequence(
        &self,
        key: &EnvelopeKey,
    ) -> Result<Option<EnvelopeSequence>, EscrowError> {
        Ok(self.sequences.read().get(key).cloned())
    }

    async fn save_sequence(
        &self,
        key: EnvelopeKey,
        sequence: EnvelopeSequence,
    ) -> Result<(), EscrowError> {
        self.sequences.write().insert(key, sequence);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<EnvelopeKey>, EscrowError> {
        Ok(self.sequences.read().keys().copied().collect())
    }
}

/// In-memory single-lock storage.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    locks: RwLock<HashMap<Address, Envelope>>,
}

impl InMemoryLockStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from snapshot entries.
    #[must_use]
    pub fn from_entries(entries: Vec<(Address, Envelope)>) -> Self {
        Self {
            locks: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Copy of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(Address, Envelope)> {
        self.locks
            .read()
            .iter()
            .map(|(owner, env)| (*owner, *env))
            .collect()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn load_lock(&self, owner: &Address) -> Result<Option<Envelope>, EscrowError> {
        Ok(self.locks.read().get(owner).copied())
    }

    async fn save_lock(&self, owner: Address, envelope: Envelope) -> Result<(), EscrowError> {
        self.locks.write().insert(owner, envelope);
        Ok(())
    }

    async fn remove_lock(&self, owner: &Address) -> Result<(), EscrowError> {
        self.locks.write().remove(owner);
        Ok(())
    }

    async fn owners(&self) -> Result<Vec<Address>, EscrowError> {
        Ok(self.locks.read().keys().copied().collect())
    }
}

/// Capture both stores into one snapshot.
#[must_use]
pub fn capture_snapshot(
    envelopes: &InMemoryEnvelopeStore,
    locks: &InMemoryLockStore,
) -> LedgerSnapshot {
    LedgerSnapshot::new(envelopes.entries(), locks.entries())
}

/// Rebuild both stores from a snapshot after validating it.
pub fn restore_snapshot(
    snapshot: LedgerSnapshot,
    capacity: usize,
) -> Result<(InMemoryEnvelopeStore, InMemoryLockStore), EscrowError> {
    snapshot
        .validate(capacity)
        .map_err(|violation| EscrowError::Storage(violation.to_string()))?;
    Ok((
        InMemoryEnvelopeStore::from_entries(snapshot.envelopes),
        InMemoryLockStore::from_entries(snapshot.locks),
    ))
}
