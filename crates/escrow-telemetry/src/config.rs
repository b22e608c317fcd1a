//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

use crate::TelemetryError;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to register the Prometheus collectors
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "timelock-escrow".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ESCROW_SERVICE_NAME`: Service name (default: timelock-escrow)
    /// - `ESCROW_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `ESCROW_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `ESCROW_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `ESCROW_METRICS`: Register Prometheus collectors (default: true)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("ESCROW_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: env::var("ESCROW_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            console_output: env_flag("ESCROW_CONSOLE_OUTPUT").unwrap_or(defaults.console_output),

            json_logs: env_flag("ESCROW_JSON_LOGS").unwrap_or(is_container),

            metrics_enabled: env_flag("ESCROW_METRICS").unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Parse configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TelemetryError> {
        serde_json::from_str(json).map_err(|e| TelemetryError::Config(e.to_string()))
    }
}

/// Parse a boolean flag; `None` when unset or unrecognised.
fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
