//! Configuration for the escrow ledger.

use crate::domain::{EscrowError, OverwritePolicy, MAX_ENVELOPES_PER_KEY};
use serde::{Deserialize, Serialize};
use std::env;

/// Ledger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum envelopes one (depositor, payee) pair may hold
    pub max_envelopes_per_key: usize,
    /// What a single-lock deposit does when the beneficiary already holds a lock
    pub overwrite_policy: OverwritePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_envelopes_per_key: MAX_ENVELOPES_PER_KEY,
            overwrite_policy: OverwritePolicy::Reject,
        }
    }
}

impl LedgerConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ESCROW_MAX_ENVELOPES`: Envelopes per (depositor, payee) (default: 10)
    /// - `ESCROW_OVERWRITE_POLICY`: `reject` or `replace` (default: reject)
    ///
    /// Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_envelopes_per_key: env::var("ESCROW_MAX_ENVELOPES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_envelopes_per_key),

            overwrite_policy: env::var("ESCROW_OVERWRITE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.overwrite_policy),
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EscrowError> {
        serde_json::from_str(json).map_err(|e| EscrowError::InvalidConfig(e.to_string()))
    }

    /// Reject configurations the ledger cannot run with.
    pub fn validate(&self) -> Result<(), EscrowError> {
        if self.max_envelopes_per_key == 0 {
            return Err(EscrowError::InvalidConfig(
                "max_envelopes_per_key must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
