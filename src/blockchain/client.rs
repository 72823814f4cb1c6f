//! LCD client with timeout and error handling.
//!
//! # Responsibilities
//! - Query chain ID, account metadata and contract code hashes
//! - Broadcast signed transactions and poll for their inclusion
//! - Run encrypted contract queries
//! - Handle timeouts, cancellation and network errors gracefully
//!
//! # Design Decisions
//! - Reads fail over to the next LCD on transport errors and 5xx; a 404 is an
//!   answer, not a failure
//! - Broadcast goes to the primary LCD only, so one signed transaction is
//!   never submitted twice
//! - Every request races the operation context

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Instant;

use crate::blockchain::types::{
    Account, BroadcastResult, ChainClientError, ChainId, ChainResult, ConfirmedTx,
};
use crate::config::{ConfirmationConfig, LcdConfig};
use crate::lifecycle::OperationContext;
use crate::observability::metrics;
use crate::resilience::RetryBudget;

const NODE_INFO_PATH: &str = "/cosmos/base/tendermint/v1beta1/node_info";
const ACCOUNTS_PATH: &str = "/cosmos/auth/v1beta1/accounts";
const TXS_PATH: &str = "/cosmos/tx/v1beta1/txs";
const CODE_HASH_PATH: &str = "/compute/v1beta1/code_hash/by_contract_address";
const QUERY_PATH: &str = "/compute/v1beta1/query";

const BROADCAST_MODE_SYNC: &str = "BROADCAST_MODE_SYNC";

/// Status and body of one LCD exchange.
struct LcdReply {
    status: StatusCode,
    url: String,
    body: String,
}

impl LcdReply {
    fn json(&self) -> ChainResult<Value> {
        serde_json::from_str(&self.body).map_err(|e| ChainClientError::Parse {
            reason: format!("{} returned invalid JSON: {}", self.url, e),
            raw: self.body.clone(),
        })
    }

    fn into_status_error(self) -> ChainClientError {
        ChainClientError::Status {
            status: self.status.as_u16(),
            endpoint: self.url,
            body: self.body,
        }
    }
}

/// REST client for a Secret Network LCD gateway.
#[derive(Clone)]
pub struct ChainClient {
    http: reqwest::Client,
    /// Primary first, then failovers.
    endpoints: Vec<String>,
    confirmation: ConfirmationConfig,
}

impl ChainClient {
    /// Create a new LCD client.
    pub fn new(lcd: &LcdConfig, confirmation: ConfirmationConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(lcd.request_timeout())
            .build()
            .map_err(|e| ChainClientError::Transport {
                endpoint: lcd.url.clone(),
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        let mut endpoints = vec![lcd.url.trim_end_matches('/').to_string()];
        for url_str in &lcd.failover_urls {
            if url::Url::parse(url_str).is_ok() {
                endpoints.push(url_str.trim_end_matches('/').to_string());
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover LCD URL");
            }
        }

        tracing::info!(
            lcd_url = %lcd.url,
            failovers = endpoints.len() - 1,
            "LCD client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            confirmation,
        })
    }

    /// Chain ID reported by the node.
    pub async fn fetch_chain_id(&self, ctx: &OperationContext) -> ChainResult<ChainId> {
        let reply = self.get(ctx, "node_info", NODE_INFO_PATH, None).await?;
        if !reply.status.is_success() {
            return Err(reply.into_status_error());
        }
        let json = reply.json()?;
        json.pointer("/default_node_info/network")
            .and_then(Value::as_str)
            .map(ChainId::from)
            .ok_or_else(|| ChainClientError::Parse {
                reason: "node_info has no default_node_info.network".to_string(),
                raw: reply.body,
            })
    }

    /// Account number and current sequence.
    pub async fn fetch_account(
        &self,
        ctx: &OperationContext,
        address: &str,
    ) -> ChainResult<Account> {
        let path = format!("{}/{}", ACCOUNTS_PATH, address);
        let reply = self.get(ctx, "account", &path, None).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ChainClientError::AccountNotFound(address.to_string()));
        }
        if !reply.status.is_success() {
            return Err(reply.into_status_error());
        }

        let json = reply.json()?;
        parse_account(&json).ok_or_else(|| ChainClientError::Parse {
            reason: format!("unrecognised account shape for {}", address),
            raw: reply.body,
        })
    }

    /// Code hash of the contract, lower-case hex.
    pub async fn fetch_code_hash(
        &self,
        ctx: &OperationContext,
        contract: &str,
    ) -> ChainResult<String> {
        let path = format!("{}/{}", CODE_HASH_PATH, contract);
        let reply = self.get(ctx, "code_hash", &path, None).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ChainClientError::ContractNotFound(contract.to_string()));
        }
        if !reply.status.is_success() {
            return Err(reply.into_status_error());
        }

        let json = reply.json()?;
        match json.get("code_hash").and_then(Value::as_str) {
            Some(hash) if !hash.is_empty() => {
                Ok(hash.trim_start_matches("0x").to_ascii_lowercase())
            }
            _ => Err(ChainClientError::Parse {
                reason: "response has no code_hash".to_string(),
                raw: reply.body,
            }),
        }
    }

    /// Submit signed transaction bytes in sync mode.
    ///
    /// The result reflects mempool admission only.
    pub async fn broadcast(
        &self,
        ctx: &OperationContext,
        tx_bytes: &[u8],
    ) -> ChainResult<BroadcastResult> {
        let body = serde_json::json!({
            "tx_bytes": BASE64.encode(tx_bytes),
            "mode": BROADCAST_MODE_SYNC,
        });
        let reply = self.post_primary(ctx, "broadcast", TXS_PATH, &body).await?;
        if !reply.status.is_success() {
            return Err(reply.into_status_error());
        }

        let json = reply.json()?;
        let result: BroadcastResult = json
            .get("tx_response")
            .cloned()
            .ok_or_else(|| ChainClientError::Parse {
                reason: "broadcast response has no tx_response".to_string(),
                raw: reply.body.clone(),
            })
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| ChainClientError::Parse {
                    reason: e.to_string(),
                    raw: reply.body.clone(),
                })
            })?;

        metrics::record_broadcast(result.code);
        tracing::info!(
            tx_hash = %result.tx_hash,
            code = result.code,
            "Transaction broadcast"
        );
        Ok(result)
    }

    /// Wait for the transaction to be indexed with execution output.
    ///
    /// Returns `Ok(None)` when the attempt or time budget runs out; a lookup
    /// still in flight when the window closes is abandoned. Lookup failures
    /// inside the budget are retried; only cancellation and the operation
    /// deadline escape as errors.
    pub async fn poll_confirmation(
        &self,
        ctx: &OperationContext,
        tx_hash: &str,
    ) -> ChainResult<Option<ConfirmedTx>> {
        let mut budget =
            RetryBudget::new(self.confirmation.max_attempts, self.confirmation.budget());
        let path = format!("{}/{}", TXS_PATH, tx_hash);

        ctx.sleep(budget.clamp_wait(self.confirmation.initial_delay())).await?;

        while let Some(attempt) = budget.next_attempt() {
            let lookup =
                tokio::time::timeout(budget.remaining(), self.get(ctx, "tx", &path, None));
            let Ok(result) = lookup.await else {
                metrics::record_confirmation_attempt("timeout");
                tracing::debug!(tx_hash = %tx_hash, attempt, "Tx lookup outlived the budget");
                break;
            };

            match result {
                Ok(reply) if reply.status == StatusCode::NOT_FOUND => {
                    metrics::record_confirmation_attempt("not_found");
                    tracing::debug!(tx_hash = %tx_hash, attempt, "Transaction not yet indexed");
                }
                Ok(reply) if reply.status.is_success() => match parse_tx_response(&reply) {
                    Ok(tx) if tx.has_execution_data() => {
                        metrics::record_confirmation_attempt("confirmed");
                        tracing::info!(
                            tx_hash = %tx_hash,
                            attempt,
                            height = tx.height,
                            code = tx.code,
                            "Transaction confirmed"
                        );
                        return Ok(Some(tx));
                    }
                    Ok(_) => {
                        metrics::record_confirmation_attempt("pending");
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            attempt,
                            "Transaction indexed without results"
                        );
                    }
                    Err(e) => {
                        metrics::record_confirmation_attempt("error");
                        tracing::warn!(
                            tx_hash = %tx_hash,
                            attempt,
                            error = %e,
                            "Unparseable tx lookup"
                        );
                    }
                },
                Ok(reply) => {
                    metrics::record_confirmation_attempt("error");
                    tracing::warn!(
                        tx_hash = %tx_hash,
                        attempt,
                        status = reply.status.as_u16(),
                        "Tx lookup failed"
                    );
                }
                Err(ChainClientError::Interrupted(interrupt)) => return Err(interrupt.into()),
                Err(e) => {
                    metrics::record_confirmation_attempt("error");
                    tracing::warn!(tx_hash = %tx_hash, attempt, error = %e, "Tx lookup failed");
                }
            }

            if budget.is_exhausted() {
                break;
            }
            ctx.sleep(budget.clamp_wait(self.confirmation.poll_interval())).await?;
        }

        tracing::warn!(
            tx_hash = %tx_hash,
            attempts = budget.attempts(),
            "Confirmation budget exhausted"
        );
        Ok(None)
    }

    /// Run an encrypted contract query and return the raw response ciphertext.
    ///
    /// Contract errors come back as a non-2xx [`ChainClientError::Status`];
    /// their body may carry an encrypted error message.
    pub async fn query_contract(
        &self,
        ctx: &OperationContext,
        contract: &str,
        envelope: &[u8],
    ) -> ChainResult<Vec<u8>> {
        let path = format!("{}/{}", QUERY_PATH, contract);
        let encoded = BASE64.encode(envelope);
        let reply = self.get(ctx, "query", &path, Some(("query", encoded.as_str()))).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ChainClientError::ContractNotFound(contract.to_string()));
        }
        if !reply.status.is_success() {
            return Err(reply.into_status_error());
        }

        let json = reply.json()?;
        let data = json.get("data").and_then(Value::as_str).unwrap_or_default();
        BASE64.decode(data).map_err(|e| ChainClientError::Parse {
            reason: format!("query data is not base64: {}", e),
            raw: reply.body,
        })
    }

    /// GET with failover across endpoints.
    async fn get(
        &self,
        ctx: &OperationContext,
        label: &'static str,
        path: &str,
        query: Option<(&str, &str)>,
    ) -> ChainResult<LcdReply> {
        let mut last_error = None;

        for (i, base) in self.endpoints.iter().enumerate() {
            let mut url = url::Url::parse(&format!("{}{}", base, path)).map_err(|e| {
                ChainClientError::Transport {
                    endpoint: base.clone(),
                    reason: format!("invalid URL: {}", e),
                }
            })?;
            if let Some((key, value)) = query {
                url.query_pairs_mut().append_pair(key, value);
            }

            match self.send(ctx, label, self.http.get(url.clone())).await {
                Ok(reply) if reply.status.is_server_error() => {
                    tracing::warn!(
                        endpoint_idx = i,
                        status = reply.status.as_u16(),
                        "LCD error, trying next endpoint"
                    );
                    last_error = Some(reply.into_status_error());
                }
                Ok(reply) => return Ok(reply),
                Err(ChainClientError::Interrupted(interrupt)) => return Err(interrupt.into()),
                Err(e) => {
                    tracing::warn!(
                        endpoint_idx = i,
                        error = %e,
                        "LCD request failed, trying next endpoint"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChainClientError::Transport {
            endpoint: path.to_string(),
            reason: "no LCD endpoints configured".to_string(),
        }))
    }

    /// POST to the primary endpoint only.
    async fn post_primary(
        &self,
        ctx: &OperationContext,
        label: &'static str,
        path: &str,
        body: &Value,
    ) -> ChainResult<LcdReply> {
        let base = self.endpoints.first().map(String::as_str).unwrap_or_default();
        let url = format!("{}{}", base, path);
        self.send(ctx, label, self.http.post(&url).json(body)).await
    }

    async fn send(
        &self,
        ctx: &OperationContext,
        label: &'static str,
        request: reqwest::RequestBuilder,
    ) -> ChainResult<LcdReply> {
        let start = Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let url = response.url().path().to_string();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(LcdReply { status, url, body })
        };

        let result = ctx.run(exchange).await?;
        metrics::record_lcd_request(label, start);

        result.map_err(|e| ChainClientError::Transport {
            endpoint: e.url().map(|u| u.path().to_string()).unwrap_or_else(|| label.to_string()),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("endpoints", &self.endpoints)
            .field("max_attempts", &self.confirmation.max_attempts)
            .finish()
    }
}

/// Normalise the account shapes the LCD returns.
///
/// Accepts flat `BaseAccount`, `{ base_account: … }` wrappers (module and
/// continuous/delayed vesting accounts) and
/// `{ base_vesting_account: { base_account: … } }`.
fn parse_account(json: &Value) -> Option<Account> {
    let account = json.get("account")?;
    let base = account
        .get("base_account")
        .or_else(|| account.pointer("/base_vesting_account/base_account"))
        .unwrap_or(account);

    Some(Account {
        account_number: json_u64(base.get("account_number"))?,
        sequence: json_u64(base.get("sequence")).unwrap_or(0),
    })
}

fn json_u64(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_tx_response(reply: &LcdReply) -> ChainResult<ConfirmedTx> {
    let json = reply.json()?;
    let tx_response = json.get("tx_response").cloned().ok_or_else(|| ChainClientError::Parse {
        reason: "tx lookup has no tx_response".to_string(),
        raw: reply.body.clone(),
    })?;
    serde_json::from_value(tx_response).map_err(|e| ChainClientError::Parse {
        reason: e.to_string(),
        raw: reply.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_parse_flat_account() {
        let body = json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": "secret1xyz",
                "account_number": "1234",
                "sequence": "7"
            }
        });
        assert_eq!(
            parse_account(&body),
            Some(Account {
                account_number: 1234,
                sequence: 7
            })
        );
    }

    #[test]
    fn test_parse_nested_account() {
        let body = json!({
            "account": {
                "@type": "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
                "base_vesting_account": {
                    "base_account": { "account_number": 55, "sequence": 3 }
                }
            }
        });
        assert_eq!(
            parse_account(&body),
            Some(Account {
                account_number: 55,
                sequence: 3
            })
        );

        let body = json!({ "account": { "base_account": { "account_number": "9" } } });
        assert_eq!(
            parse_account(&body),
            Some(Account {
                account_number: 9,
                sequence: 0
            })
        );
    }

    #[test]
    fn test_parse_account_rejects_garbage() {
        assert_eq!(parse_account(&json!({ "account": { "foo": 1 } })), None);
        assert_eq!(parse_account(&json!({ "nope": {} })), None);
    }

    #[tokio::test]
    async fn test_unreachable_lcd_is_transport_error() {
        let lcd = LcdConfig {
            url: "http://127.0.0.1:1".to_string(),
            failover_urls: vec!["not a url".to_string()],
            request_timeout_secs: 2,
        };
        let client = ChainClient::new(&lcd, ConfirmationConfig::default()).unwrap();
        let ctx = OperationContext::with_timeout(Duration::from_secs(5));

        let err = client.fetch_chain_id(&ctx).await.unwrap_err();
        assert!(matches!(err, ChainClientError::Transport { .. }));
    }
}
