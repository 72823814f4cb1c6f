//! Execute and query orchestration.
//!
//! # Responsibilities
//! - Validate caller input before any network call
//! - Fetch chain ID and account, abort early if the sender has no account
//! - Encrypt each call, build and sign the transaction, broadcast it
//! - Best-effort confirmation and response decryption
//!
//! # Design Decisions
//! - One operation is one sequential task; nothing is shared between
//!   operations except the read-only client and cipher
//! - Account and chain ID are fetched fresh for every transaction
//! - Confirmation never turns a submitted transaction into an error, except
//!   when the chain reports a failed execution for it

use prost::Message;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::Instrument;

use crate::blockchain::transaction::parse_funds;
use crate::blockchain::{
    ChainClient, ChainClientError, ChainId, ConfirmedTx, ExecuteMsg, TransactionBuilder, TxStatus,
    WalletKeyProvider,
};
use crate::config::PipelineConfig;
use crate::crypto::cipher::{decode_plaintext_json, extract_encrypted_error};
use crate::crypto::{EncryptionSeed, MessageCipher, MessageEncryptor, Nonce};
use crate::encoding::address;
use crate::encoding::proto::{
    MsgExecuteContractResponse, TxMsgData, MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL,
};
use crate::lifecycle::OperationContext;
use crate::observability::metrics;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::state::{PipelineState, StateTracker};
use crate::pipeline::types::{ExecuteOutcome, ExecuteRequest, QueryRequest};

/// Runs execute and query operations against one network.
pub struct Pipeline<E = MessageCipher> {
    client: ChainClient,
    builder: TransactionBuilder,
    encryptor: E,
    address_prefix: String,
    chain_id: Option<ChainId>,
    confirm: bool,
    operation_timeout: Duration,
}

impl Pipeline<MessageCipher> {
    /// Pipeline using the network key from configuration.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let cipher = MessageCipher::from_base64(&config.network.consensus_io_pubkey)
            .map_err(|e| PipelineError::Validation(format!("network.consensus_io_pubkey: {}", e)))?;
        Self::with_encryptor(config, cipher)
    }
}

impl<E: MessageEncryptor> Pipeline<E> {
    /// Pipeline with a caller-supplied encryptor.
    pub fn with_encryptor(config: &PipelineConfig, encryptor: E) -> PipelineResult<Self> {
        let client = ChainClient::new(&config.lcd, config.confirmation.clone())
            .map_err(|e| PipelineError::from_chain("create LCD client", e))?;

        Ok(Self {
            client,
            builder: TransactionBuilder::new(
                config.fee.clone(),
                config.network.address_prefix.clone(),
            ),
            encryptor,
            address_prefix: config.network.address_prefix.clone(),
            chain_id: config.network.chain_id.clone().map(ChainId),
            confirm: config.confirmation.enabled,
            operation_timeout: config.operation.timeout(),
        })
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    pub fn encryptor(&self) -> &E {
        &self.encryptor
    }

    /// Fresh context bounded by the configured operation timeout.
    pub fn new_context(&self) -> OperationContext {
        OperationContext::with_timeout(self.operation_timeout)
    }

    /// Encrypt, sign and submit one transaction.
    pub async fn execute(
        &self,
        ctx: &OperationContext,
        wallet: &dyn WalletKeyProvider,
        request: ExecuteRequest,
    ) -> PipelineResult<ExecuteOutcome> {
        let span = tracing::info_span!(
            "execute",
            operation_id = %ctx.id(),
            sender = %wallet.address()
        );
        let mut tracker = StateTracker::new(ctx.id(), "execute");

        let result = self
            .run_execute(ctx, wallet, &request, &mut tracker)
            .instrument(span)
            .await;
        finish("execute", &mut tracker, &result);
        result
    }

    /// Encrypted contract query; returns the decrypted JSON answer.
    pub async fn query(
        &self,
        ctx: &OperationContext,
        wallet: &dyn WalletKeyProvider,
        request: QueryRequest,
    ) -> PipelineResult<Value> {
        let span = tracing::info_span!(
            "query",
            operation_id = %ctx.id(),
            contract = %request.contract
        );
        let mut tracker = StateTracker::new(ctx.id(), "query");

        let result = self
            .run_query(ctx, wallet, &request, &mut tracker)
            .instrument(span)
            .await;
        finish("query", &mut tracker, &result);
        result
    }

    async fn run_execute(
        &self,
        ctx: &OperationContext,
        wallet: &dyn WalletKeyProvider,
        request: &ExecuteRequest,
        tracker: &mut StateTracker,
    ) -> PipelineResult<ExecuteOutcome> {
        self.validate_execute(wallet, request)?;
        ctx.check()?;

        tracker.advance(PipelineState::FetchingAccount);
        let account_fut = async {
            self.client
                .fetch_account(ctx, wallet.address())
                .await
                .map_err(|e| PipelineError::from_chain("fetch account", e))
        };
        let (chain_id, account) = tokio::try_join!(self.resolve_chain_id(ctx), account_fut)?;
        tracing::debug!(
            chain_id = %chain_id,
            account_number = account.account_number,
            sequence = account.sequence,
            "Account loaded"
        );

        tracker.advance(PipelineState::Encrypting);
        let seed = wallet.encryption_seed();
        let mut code_hashes: HashMap<&str, String> = HashMap::new();
        let mut messages = Vec::with_capacity(request.calls.len());
        let mut nonces = Vec::with_capacity(request.calls.len());

        for (index, call) in request.calls.iter().enumerate() {
            let code_hash = match code_hashes.get(call.contract.as_str()) {
                Some(hash) => hash.clone(),
                None => {
                    let hash = self
                        .resolve_code_hash(ctx, &call.contract, call.code_hash.as_deref())
                        .await?;
                    code_hashes.insert(call.contract.as_str(), hash.clone());
                    hash
                }
            };

            let envelope = self
                .encryptor
                .encrypt(Some(&code_hash), &call.msg, &seed)
                .map_err(|e| PipelineError::from_cipher(index, &call.contract, e))?;
            tracing::debug!(index, contract = %call.contract, "Message encrypted");

            nonces.push(*envelope.nonce());
            messages.push(ExecuteMsg {
                sender: wallet.address().to_string(),
                contract: call.contract.clone(),
                code_hash: Some(code_hash),
                encrypted_payload: envelope.to_bytes(),
                funds: call.funds.clone(),
            });
        }

        tracker.advance(PipelineState::Building);
        let signed = self.builder.build(&messages, &request.memo, account, &chain_id, wallet)?;
        let local_hash = signed.hash();

        tracker.advance(PipelineState::Broadcasting);
        let broadcast = self
            .client
            .broadcast(ctx, signed.as_bytes())
            .await
            .map_err(|e| PipelineError::from_chain("broadcast", e))?;
        let tx_hash = if broadcast.tx_hash.is_empty() {
            local_hash
        } else {
            broadcast.tx_hash.clone()
        };

        if !broadcast.is_accepted() {
            return Err(self.chain_rejection(
                broadcast.code,
                tx_hash,
                broadcast.raw_log,
                &nonces,
                &seed,
            ));
        }

        let mut outcome = ExecuteOutcome {
            tx_hash: tx_hash.clone(),
            broadcast,
            status: TxStatus::Unconfirmed,
            responses: vec![None; nonces.len()],
        };
        if !self.confirm {
            return Ok(outcome);
        }

        tracker.advance(PipelineState::Confirming);
        let confirmed = match self.client.poll_confirmation(ctx, &tx_hash).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    error = %e,
                    "Confirmation abandoned, keeping broadcast result"
                );
                None
            }
        };

        match confirmed {
            Some(tx) if tx.code != 0 => {
                Err(self.chain_rejection(tx.code, tx_hash, tx.raw_log, &nonces, &seed))
            }
            Some(tx) => {
                outcome.responses = self.decrypt_responses(&tx, &nonces, &seed);
                outcome.status = TxStatus::Confirmed(tx);
                Ok(outcome)
            }
            None => Ok(outcome),
        }
    }

    async fn run_query(
        &self,
        ctx: &OperationContext,
        wallet: &dyn WalletKeyProvider,
        request: &QueryRequest,
        tracker: &mut StateTracker,
    ) -> PipelineResult<Value> {
        self.validate_call(0, &request.contract, &request.query, request.code_hash.as_deref())?;
        ctx.check()?;

        tracker.advance(PipelineState::Encrypting);
        let code_hash = self
            .resolve_code_hash(ctx, &request.contract, request.code_hash.as_deref())
            .await?;
        let seed = wallet.encryption_seed();
        let envelope = self
            .encryptor
            .encrypt(Some(&code_hash), &request.query, &seed)
            .map_err(|e| PipelineError::from_cipher(0, &request.contract, e))?;

        tracker.advance(PipelineState::Querying);
        let ciphertext = match self
            .client
            .query_contract(ctx, &request.contract, &envelope.to_bytes())
            .await
        {
            Ok(ciphertext) => ciphertext,
            Err(ChainClientError::Status { status, endpoint, body }) => {
                let decrypted = self.decrypt_contract_error(&body, &[*envelope.nonce()], &seed);
                if decrypted.is_none() && status >= 500 {
                    return Err(PipelineError::from_chain(
                        "query contract",
                        ChainClientError::Status { status, endpoint, body },
                    ));
                }
                return Err(PipelineError::QueryRejected {
                    contract: request.contract.clone(),
                    message: error_message(&body),
                    decrypted,
                });
            }
            Err(e) => return Err(PipelineError::from_chain("query contract", e)),
        };

        tracker.advance(PipelineState::Decrypting);
        let plaintext = self
            .encryptor
            .decrypt(&ciphertext, envelope.nonce(), &seed)
            .map_err(|e| PipelineError::from_cipher(0, &request.contract, e))?;
        decode_plaintext_json(&plaintext)
            .map_err(|e| PipelineError::from_cipher(0, &request.contract, e))
    }

    fn validate_execute(
        &self,
        wallet: &dyn WalletKeyProvider,
        request: &ExecuteRequest,
    ) -> PipelineResult<()> {
        if request.calls.is_empty() {
            return Err(PipelineError::Validation(
                "at least one contract call is required".to_string(),
            ));
        }
        address::decode(wallet.address(), &self.address_prefix).map_err(|e| {
            PipelineError::Validation(format!("sender address '{}': {}", wallet.address(), e))
        })?;

        for (index, call) in request.calls.iter().enumerate() {
            self.validate_call(index, &call.contract, &call.msg, call.code_hash.as_deref())?;
            if let Some(funds) = call.funds.as_deref() {
                parse_funds(funds).map_err(|reason| {
                    PipelineError::Validation(format!("message {}: funds: {}", index, reason))
                })?;
            }
        }
        Ok(())
    }

    fn validate_call(
        &self,
        index: usize,
        contract: &str,
        msg: &str,
        code_hash: Option<&str>,
    ) -> PipelineResult<()> {
        if contract.trim().is_empty() {
            return Err(PipelineError::Validation(format!(
                "message {}: contract address is required",
                index
            )));
        }
        let msg = msg.trim();
        if msg.is_empty() {
            return Err(PipelineError::Validation(format!(
                "message {}: message is required",
                index
            )));
        }
        if !(msg.starts_with('{') && msg.ends_with('}')) {
            return Err(PipelineError::Validation(format!(
                "message {}: message must be a JSON object",
                index
            )));
        }
        if let Some(hash) = code_hash {
            let hash = normalize_code_hash(hash);
            if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(PipelineError::Validation(format!(
                    "message {}: code hash must be 32 bytes of hex",
                    index
                )));
            }
        }
        address::decode(contract, &self.address_prefix).map_err(|source| {
            PipelineError::InvalidAddress {
                index,
                address: contract.to_string(),
                source,
            }
        })?;
        Ok(())
    }

    async fn resolve_chain_id(&self, ctx: &OperationContext) -> PipelineResult<ChainId> {
        match &self.chain_id {
            Some(id) => Ok(id.clone()),
            None => self
                .client
                .fetch_chain_id(ctx)
                .await
                .map_err(|e| PipelineError::from_chain("fetch chain id", e)),
        }
    }

    async fn resolve_code_hash(
        &self,
        ctx: &OperationContext,
        contract: &str,
        supplied: Option<&str>,
    ) -> PipelineResult<String> {
        match supplied {
            Some(hash) => Ok(normalize_code_hash(hash)),
            None => {
                let hash = self
                    .client
                    .fetch_code_hash(ctx, contract)
                    .await
                    .map_err(|e| PipelineError::from_chain("fetch code hash", e))?;
                tracing::debug!(contract = %contract, code_hash = %hash, "Code hash resolved");
                Ok(hash)
            }
        }
    }

    fn chain_rejection(
        &self,
        code: u32,
        tx_hash: String,
        raw_log: String,
        nonces: &[Nonce],
        seed: &EncryptionSeed,
    ) -> PipelineError {
        let decrypted = self.decrypt_contract_error(&raw_log, nonces, seed);
        PipelineError::Chain {
            code,
            tx_hash,
            raw_log,
            decrypted,
        }
    }

    /// Decrypt an `encrypted: …` contract error with whichever message nonce
    /// authenticates it.
    fn decrypt_contract_error(
        &self,
        log: &str,
        nonces: &[Nonce],
        seed: &EncryptionSeed,
    ) -> Option<Value> {
        let ciphertext = extract_encrypted_error(log)?;
        let plaintext = nonces
            .iter()
            .find_map(|nonce| self.encryptor.decrypt(&ciphertext, nonce, seed).ok())?;
        Some(decode_plaintext_json(&plaintext).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&plaintext).into_owned())
        }))
    }

    /// Decrypt each `MsgExecuteContractResponse` carried in the tx data.
    fn decrypt_responses(
        &self,
        tx: &ConfirmedTx,
        nonces: &[Nonce],
        seed: &EncryptionSeed,
    ) -> Vec<Option<Value>> {
        let mut responses = vec![None; nonces.len()];
        let Some(payloads) = execute_response_payloads(&tx.data) else {
            return responses;
        };

        for (index, (payload, nonce)) in payloads.iter().zip(nonces).enumerate() {
            let Some(payload) = payload else { continue };
            match self
                .encryptor
                .decrypt(payload, nonce, seed)
                .and_then(|plain| decode_plaintext_json(&plain))
            {
                Ok(value) => responses[index] = Some(value),
                Err(e) => tracing::warn!(index, error = %e, "Could not decrypt execute response"),
            }
        }
        responses
    }
}

impl<E> std::fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("client", &self.client)
            .field("chain_id", &self.chain_id)
            .field("confirm", &self.confirm)
            .finish_non_exhaustive()
    }
}

fn finish<T>(kind: &'static str, tracker: &mut StateTracker, result: &PipelineResult<T>) {
    match result {
        Ok(_) => {
            tracker.advance(PipelineState::Done);
            metrics::record_operation(kind, "success");
        }
        Err(e) => {
            tracker.fail(e);
            metrics::record_operation(kind, e.kind());
        }
    }
}

fn normalize_code_hash(hash: &str) -> String {
    let hash = hash.trim();
    hash.strip_prefix("0x").unwrap_or(hash).to_ascii_lowercase()
}

/// Pull the human-readable message out of an LCD error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Per-message response ciphertexts from hex `TxMsgData`, in message order.
///
/// Newer nodes fill `msg_responses`; older ones the legacy `data` list.
fn execute_response_payloads(data_hex: &str) -> Option<Vec<Option<Vec<u8>>>> {
    if data_hex.is_empty() {
        return None;
    }
    let bytes = hex::decode(data_hex).ok()?;
    let msg_data = TxMsgData::decode(bytes.as_slice()).ok()?;

    let decode = |type_url: &str, value: &[u8]| {
        (type_url == MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL)
            .then(|| MsgExecuteContractResponse::decode(value).ok().map(|r| r.data))
            .flatten()
    };

    let payloads = if msg_data.msg_responses.is_empty() {
        msg_data
            .data
            .iter()
            .map(|d| decode(legacy_type_url(&d.msg_type), &d.data))
            .collect()
    } else {
        msg_data
            .msg_responses
            .iter()
            .map(|any| decode(&any.type_url, &any.value))
            .collect()
    };
    Some(payloads)
}

// Legacy MsgData carries the request type name, not the response type URL.
fn legacy_type_url(msg_type: &str) -> &str {
    match msg_type.trim_start_matches('/') {
        "secret.compute.v1beta1.MsgExecuteContract" | "execute" => {
            MSG_EXECUTE_CONTRACT_RESPONSE_TYPE_URL
        }
        other => other,
    }
}
