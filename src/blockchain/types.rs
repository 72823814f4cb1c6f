//! Chain-specific types and error definitions.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::lifecycle::Interrupt;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl From<&str> for ChainId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ChainId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur while talking to the LCD.
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// Connection, TLS or timeout failure.
    #[error("transport error calling {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// Non-2xx status other than a meaningful 404.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The LCD has no account for this address (never funded).
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The LCD knows no contract at this address.
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    /// Response body did not have the expected shape.
    #[error("unexpected response: {reason}")]
    Parse { reason: String, raw: String },

    /// Operation cancelled or out of time.
    #[error(transparent)]
    Interrupted(#[from] Interrupt),
}

/// Result type for LCD operations.
pub type ChainResult<T> = Result<T, ChainClientError>;

/// On-chain account metadata needed to sign.
///
/// Always fetched fresh; `sequence` changes with every transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Account {
    pub account_number: u64,
    pub sequence: u64,
}

/// Immediate mempool verdict for a broadcast.
///
/// `code == 0` only means the mempool accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub code: u32,
    #[serde(rename = "txhash")]
    pub tx_hash: String,
    #[serde(default)]
    pub raw_log: String,
}

impl BroadcastResult {
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

/// Indexed transaction returned by `GET /cosmos/tx/v1beta1/txs/{hash}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedTx {
    #[serde(default)]
    pub code: u32,
    #[serde(rename = "txhash")]
    pub tx_hash: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub height: u64,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_wanted: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gas_used: u64,
    /// Hex-encoded `TxMsgData`.
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

impl ConfirmedTx {
    /// True once the node has execution output for the transaction.
    pub fn has_execution_data(&self) -> bool {
        !self.raw_log.is_empty()
            || !self.events.is_empty()
            || !self.logs.is_empty()
            || !self.data.is_empty()
    }

    /// The result of the broadcast, as seen after inclusion.
    pub fn as_broadcast_result(&self) -> BroadcastResult {
        BroadcastResult {
            code: self.code,
            tx_hash: self.tx_hash.clone(),
            raw_log: self.raw_log.clone(),
        }
    }
}

/// Where a submitted transaction ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "tx", rename_all = "snake_case")]
pub enum TxStatus {
    /// Included in a block with the given result code.
    Confirmed(ConfirmedTx),
    /// Accepted into the mempool but not seen within the poll budget, or
    /// polling was disabled or interrupted.
    Unconfirmed,
}

/// Accept `"123"`, `123` or `null` for a u64 field.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Null => Ok(0),
        Raw::Str(s) if s.is_empty() => Ok(0),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
