//! Prometheus metrics for the escrow ledger.
//!
//! All metrics follow the naming convention: `escrow_<metric>_<unit>`
//!
//! Values are tracked in the ledger's smallest unit and exported as `f64`,
//! so very large balances lose precision in the exported series only.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DEPOSIT METRICS
    // =========================================================================

    /// Accepted deposits
    pub static ref DEPOSITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("escrow_deposits_total", "Total deposits accepted"),
        &["ledger"]  // ledger: envelope/single_lock
    ).expect("metric creation failed");

    // =========================================================================
    // RELEASE METRICS
    // =========================================================================

    /// Successful multi-envelope disbursements
    pub static ref DISBURSEMENTS_TOTAL: Counter = Counter::new(
        "escrow_disbursements_total",
        "Total successful disbursements"
    ).expect("metric creation failed");

    /// Envelopes released by disbursements
    pub static ref ENVELOPES_RELEASED_TOTAL: Counter = Counter::new(
        "escrow_envelopes_released_total",
        "Total envelopes released by disbursements"
    ).expect("metric creation failed");

    /// Successful single-lock withdrawals
    pub static ref WITHDRAWALS_TOTAL: Counter = Counter::new(
        "escrow_withdrawals_total",
        "Total successful withdrawals"
    ).expect("metric creation failed");

    /// Value transferred out of escrow
    pub static ref VALUE_RELEASED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("escrow_value_released_total", "Total value transferred out of escrow"),
        &["ledger"]
    ).expect("metric creation failed");

    // =========================================================================
    // CUSTODY METRICS
    // =========================================================================

    /// Value backing stored envelopes
    pub static ref VALUE_HELD: GaugeVec = GaugeVec::new(
        Opts::new("escrow_value_held", "Value currently locked in envelopes"),
        &["ledger"]
    ).expect("metric creation failed");

    /// Value whose transfer is pending
    pub static ref VALUE_IN_FLIGHT: GaugeVec = GaugeVec::new(
        Opts::new("escrow_value_in_flight", "Value released from storage, transfer pending"),
        &["ledger"]
    ).expect("metric creation failed");

    /// Value discarded by lock overwrites
    pub static ref VALUE_ORPHANED: GaugeVec = GaugeVec::new(
        Opts::new("escrow_value_orphaned", "Value no longer backed by any envelope"),
        &["ledger"]
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Rejected calls by operation and error kind
    pub static ref REJECTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("escrow_rejections_total", "Rejected calls by operation and kind"),
        &["operation", "kind"]
    ).expect("metric creation failed");

    /// Outbound transfers that failed and were rolled back
    pub static ref TRANSFER_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("escrow_transfer_failures_total", "Failed outbound transfers"),
        &["ledger"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; collectors already registered are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Deposits
        Box::new(DEPOSITS_TOTAL.clone()),
        // Releases
        Box::new(DISBURSEMENTS_TOTAL.clone()),
        Box::new(ENVELOPES_RELEASED_TOTAL.clone()),
        Box::new(WITHDRAWALS_TOTAL.clone()),
        Box::new(VALUE_RELEASED_TOTAL.clone()),
        // Custody
        Box::new(VALUE_HELD.clone()),
        Box::new(VALUE_IN_FLIGHT.clone()),
        Box::new(VALUE_ORPHANED.clone()),
        // Errors
        Box::new(REJECTIONS_TOTAL.clone()),
        Box::new(TRANSFER_FAILURES_TOTAL.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Count an accepted deposit.
pub fn record_deposit(ledger: &str) {
    DEPOSITS_TOTAL.with_label_values(&[ledger]).inc();
}

/// Count a successful disbursement.
pub fn record_disbursement(envelopes: usize, amount: u128) {
    DISBURSEMENTS_TOTAL.inc();
    ENVELOPES_RELEASED_TOTAL.inc_by(envelopes as f64);
    VALUE_RELEASED_TOTAL
        .with_label_values(&["envelope"])
        .inc_by(amount as f64);
}

/// Count a successful withdrawal.
pub fn record_withdrawal(amount: u128) {
    WITHDRAWALS_TOTAL.inc();
    VALUE_RELEASED_TOTAL
        .with_label_values(&["single_lock"])
        .inc_by(amount as f64);
}

/// Count a rejected call.
pub fn record_rejection(operation: &str, kind: &str) {
    REJECTIONS_TOTAL.with_label_values(&[operation, kind]).inc();
}

/// Count a failed outbound transfer.
pub fn record_transfer_failure(ledger: &str) {
    TRANSFER_FAILURES_TOTAL.with_label_values(&[ledger]).inc();
}

/// Publish the custody buckets of a ledger.
pub fn record_custody(ledger: &str, held: u128, in_flight: u128, orphaned: u128) {
    VALUE_HELD.with_label_values(&[ledger]).set(held as f64);
    VALUE_IN_FLIGHT.with_label_values(&[ledger]).set(in_flight as f64);
    VALUE_ORPHANED.with_label_values(&[ledger]).set(orphaned as f64);
}
