//! Requests and outcomes of pipeline operations.

use serde::Serialize;
use serde_json::Value;

use crate::blockchain::{BroadcastResult, TxStatus};

/// One contract call inside an execute transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Bech32 contract address.
    pub contract: String,
    /// Contract code hash; looked up on the LCD when absent.
    pub code_hash: Option<String>,
    /// Plaintext JSON handle message. Treated as opaque.
    pub msg: String,
    /// Funds attached to the call, e.g. `"1000uscrt"`.
    pub funds: Option<String>,
}

impl ContractCall {
    pub fn new(contract: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            code_hash: None,
            msg: msg.into(),
            funds: None,
        }
    }

    pub fn with_code_hash(mut self, code_hash: impl Into<String>) -> Self {
        self.code_hash = Some(code_hash.into());
        self
    }

    pub fn with_funds(mut self, funds: impl Into<String>) -> Self {
        self.funds = Some(funds.into());
        self
    }
}

/// A transaction of one or more contract calls from one sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub calls: Vec<ContractCall>,
    pub memo: String,
}

impl ExecuteRequest {
    pub fn single(call: ContractCall) -> Self {
        Self {
            calls: vec![call],
            memo: String::new(),
        }
    }

    pub fn batch(calls: Vec<ContractCall>) -> Self {
        Self {
            calls,
            memo: String::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// A read-only contract query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub contract: String,
    pub code_hash: Option<String>,
    /// Plaintext JSON query message.
    pub query: String,
}

impl QueryRequest {
    pub fn new(contract: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            code_hash: None,
            query: query.into(),
        }
    }

    pub fn with_code_hash(mut self, code_hash: impl Into<String>) -> Self {
        self.code_hash = Some(code_hash.into());
        self
    }
}

/// Result of a submitted execute transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteOutcome {
    pub tx_hash: String,
    /// Mempool verdict from the broadcast.
    pub broadcast: BroadcastResult,
    /// Inclusion detail, when confirmation found it.
    pub status: TxStatus,
    /// Decrypted response of each call, in call order. `None` when the
    /// transaction was not confirmed or the call returned nothing readable.
    pub responses: Vec<Option<Value>>,
}

impl ExecuteOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, TxStatus::Confirmed(_))
    }
}
