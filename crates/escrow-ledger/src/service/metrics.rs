//! Prometheus hooks. No-ops unless the `metrics` feature is enabled.

use crate::domain::{Amount, Custody};

#[cfg(feature = "metrics")]
mod enabled {
    use super::{Amount, Custody};
    use escrow_telemetry::metrics;

    pub(crate) fn record_deposit(ledger: &'static str) {
        metrics::record_deposit(ledger);
    }

    pub(crate) fn record_disbursement(envelopes: usize, amount: Amount) {
        metrics::record_disbursement(envelopes, amount);
    }

    pub(crate) fn record_withdrawal(amount: Amount) {
        metrics::record_withdrawal(amount);
    }

    pub(crate) fn record_rejection(operation: &'static str, kind: &'static str) {
        metrics::record_rejection(operation, kind);
    }

    pub(crate) fn record_transfer_failure(ledger: &'static str) {
        metrics::record_transfer_failure(ledger);
    }

    pub(crate) fn record_custody(ledger: &'static str, custody: &Custody) {
        metrics::record_custody(ledger, custody.held, custody.in_flight, custody.orphaned);
    }
}

#[cfg(not(feature = "metrics"))]
mod enabled {
    use super::{Amount, Custody};

    pub(crate) fn record_deposit(_ledger: &'static str) {}

    pub(crate) fn record_disbursement(_envelopes: usize, _amount: Amount) {}

    pub(crate) fn record_withdrawal(_amount: Amount) {}

    pub(crate) fn record_rejection(_operation: &'static str, _kind: &'static str) {}

    pub(crate) fn record_transfer_failure(_ledger: &'static str) {}

    pub(crate) fn record_custody(_ledger: &'static str, _custody: &Custody) {}
}

pub(crate) use enabled::*;
