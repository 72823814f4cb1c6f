//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::encoding::address::DEFAULT_PREFIX;

/// Root configuration for the transaction pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// LCD gateway settings.
    pub lcd: LcdConfig,

    /// Network identity and encryption key.
    pub network: NetworkConfig,

    /// Flat transaction fee.
    pub fee: FeeConfig,

    /// Confirmation polling budget.
    pub confirmation: ConfirmationConfig,

    /// Whole-operation limits.
    pub operation: OperationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// LCD (REST gateway) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LcdConfig {
    /// Primary LCD base URL.
    pub url: String,

    /// Fallback LCD base URLs, tried in order for read requests.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            url: "https://lcd.mainnet.secretsaturn.net".to_string(),
            failover_urls: Vec::new(),
            request_timeout_secs: 15,
        }
    }
}

impl LcdConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Network identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ID override. When unset, fetched from `node_info` per operation.
    pub chain_id: Option<String>,

    /// Bech32 human-readable prefix.
    pub address_prefix: String,

    /// Consensus IO public key, base64.
    pub consensus_io_pubkey: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: None,
            address_prefix: DEFAULT_PREFIX.to_string(),
            consensus_io_pubkey: "79++5YOHfm0SwhlpUDClv7cuCjq9xBZlWqSjDJWkRG8=".to_string(),
        }
    }
}

/// Fee attached to every transaction.
///
/// One gas limit for single- and multi-message transactions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    pub gas_limit: u64,

    /// Integer fee amount in `denom`.
    pub amount: String,

    pub denom: String,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            gas_limit: 200_000,
            amount: "50000".to_string(),
            denom: "uscrt".to_string(),
        }
    }
}

/// Confirmation polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Poll for inclusion after broadcast.
    pub enabled: bool,

    /// Wait before the first query in milliseconds.
    pub initial_delay_ms: u64,

    /// Fixed wait between queries in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum number of queries.
    pub max_attempts: u32,

    /// Overall wall-clock budget in seconds.
    pub budget_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 3000,
            poll_interval_ms: 2000,
            max_attempts: 10,
            budget_secs: 30,
        }
    }
}

impl ConfirmationConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }
}

/// Whole-operation limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationConfig {
    /// Deadline for one execute or query, in seconds.
    pub timeout_secs: u64,
}

impl Default for OperationConfig {
    fn default() -> Self {
        Self { timeout_secs: 90 }
    }
}

impl OperationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
