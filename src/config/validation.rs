//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts > 0)
//! - Check that the LCD URLs and the consensus key parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::PipelineConfig;
use crate::crypto::MessageCipher;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a parsed configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.lcd.url) {
        errors.push(ValidationError::new(
            "lcd.url",
            format!("invalid URL '{}': {}", config.lcd.url, e),
        ));
    }
    for failover in &config.lcd.failover_urls {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(
                "lcd.failover_urls",
                format!("invalid URL '{}': {}", failover, e),
            ));
        }
    }
    if config.lcd.request_timeout_secs == 0 {
        errors.push(ValidationError::new("lcd.request_timeout_secs", "must be greater than 0"));
    }

    let prefix = &config.network.address_prefix;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            "network.address_prefix",
            format!("'{}' is not a lowercase bech32 prefix", prefix),
        ));
    }
    if let Some(chain_id) = &config.network.chain_id {
        if chain_id.trim().is_empty() {
            errors.push(ValidationError::new("network.chain_id", "must not be empty when set"));
        }
    }
    if let Err(e) = MessageCipher::from_base64(&config.network.consensus_io_pubkey) {
        errors.push(ValidationError::new("network.consensus_io_pubkey", e.to_string()));
    }

    if config.fee.gas_limit == 0 {
        errors.push(ValidationError::new("fee.gas_limit", "must be greater than 0"));
    }
    if config.fee.amount.is_empty() || !config.fee.amount.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            "fee.amount",
            format!("'{}' is not an integer amount", config.fee.amount),
        ));
    }
    if config.fee.denom.is_empty() {
        errors.push(ValidationError::new("fee.denom", "must not be empty"));
    }

    if config.confirmation.max_attempts == 0 {
        errors.push(ValidationError::new("confirmation.max_attempts", "must be greater than 0"));
    }
    if config.confirmation.budget_secs == 0 {
        errors.push(ValidationError::new("confirmation.budget_secs", "must be greater than 0"));
    }
    if config.operation.timeout_secs == 0 {
        errors.push(ValidationError::new("operation.timeout_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
