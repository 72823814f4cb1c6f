//! Pipeline error taxonomy.
//!
//! Lower layers return their own error enums; the coordinator wraps them
//! here with the message index and contract they concern.

use thiserror::Error;

use crate::blockchain::{ChainClientError, TxBuildError};
use crate::crypto::CipherError;
use crate::encoding::AddressError;
use crate::lifecycle::Interrupt;

/// Errors surfaced by [`Pipeline`](crate::pipeline::Pipeline) operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or malformed caller input. No network call was made.
    #[error("invalid request: {0}")]
    Validation(String),

    /// An address failed to decode.
    #[error("message {index}: invalid address '{address}': {source}")]
    InvalidAddress {
        index: usize,
        address: String,
        #[source]
        source: AddressError,
    },

    /// Encryption or decryption failed.
    #[error("message {index} to {contract}: {source}")]
    Crypto {
        index: usize,
        contract: String,
        #[source]
        source: CipherError,
    },

    /// The transaction could not be assembled or signed.
    #[error("failed to build transaction: {0}")]
    Build(#[from] TxBuildError),

    /// Transport failure or unexpected HTTP status.
    #[error("{context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: ChainClientError,
    },

    /// The sender has no on-chain account yet.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// No contract at this address.
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    /// The chain rejected the transaction. `raw_log` is verbatim.
    #[error("transaction {tx_hash} rejected with code {code}: {raw_log}")]
    Chain {
        code: u32,
        tx_hash: String,
        raw_log: String,
        /// Contract error decrypted from `raw_log`, when it carried one.
        decrypted: Option<serde_json::Value>,
    },

    /// The contract rejected a query.
    #[error("query to {contract} failed: {message}")]
    QueryRejected {
        contract: String,
        message: String,
        decrypted: Option<serde_json::Value>,
    },

    /// A response did not decode under any supported form.
    #[error("unparseable response: {reason}")]
    Parse { reason: String, raw: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    /// Wrap an LCD error, keeping the variants callers branch on.
    pub fn from_chain(context: &'static str, err: ChainClientError) -> Self {
        match err {
            ChainClientError::AccountNotFound(address) => Self::AccountNotFound(address),
            ChainClientError::ContractNotFound(contract) => Self::ContractNotFound(contract),
            ChainClientError::Parse { reason, raw } => Self::Parse { reason, raw },
            ChainClientError::Interrupted(interrupt) => interrupt.into(),
            other => Self::Network {
                context,
                source: other,
            },
        }
    }

    /// Low-cardinality label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidAddress { .. } | Self::Crypto { .. } => "crypto",
            Self::Build(TxBuildError::InvalidAddress { .. }) => "crypto",
            Self::Build(TxBuildError::UnsupportedFundsFormat { .. }) => "validation",
            Self::Build(_) => "build",
            Self::Network { .. } => "network",
            Self::AccountNotFound(_) | Self::ContractNotFound(_) => "not_found",
            Self::Chain { .. } | Self::QueryRejected { .. } => "chain",
            Self::Parse { .. } => "parse",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }

    /// Wrap a cipher error for message `index`. Parse failures keep their
    /// raw payload.
    pub fn from_cipher(index: usize, contract: &str, err: CipherError) -> Self {
        match err {
            CipherError::Parse { reason, raw } => Self::Parse { reason, raw },
            other => Self::Crypto {
                index,
                contract: contract.to_string(),
                source: other,
            },
        }
    }
}

impl From<Interrupt> for PipelineError {
    fn from(interrupt: Interrupt) -> Self {
        match interrupt {
            Interrupt::Cancelled => Self::Cancelled,
            Interrupt::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
