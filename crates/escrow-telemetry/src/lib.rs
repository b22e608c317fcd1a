//! # Escrow Telemetry
//!
//! Logging and metrics for the escrow ledger.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter`, plain or JSON output
//! - **Metrics**: Prometheus counters and gauges, exported in text format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use escrow_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!
//!     // Ledger logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ESCROW_SERVICE_NAME` | `timelock-escrow` | Service name in logs |
//! | `ESCROW_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `ESCROW_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |
//! | `ESCROW_JSON_LOGS` | `false` | JSON log lines |
//! | `ESCROW_METRICS` | `true` | Register Prometheus collectors |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, register_metrics, REGISTRY};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, if enabled, register the metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics_enabled {
        register_metrics()?;
    }
    init_logging(config)
}
