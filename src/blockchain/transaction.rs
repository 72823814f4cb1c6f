//! Transaction building and signing.
//!
//! # Responsibilities
//! - Turn encrypted contract calls into `MsgExecuteContract` messages
//! - Assemble body, auth info and sign doc in the chain's protobuf encoding
//! - Hand the sign doc to the wallet and return broadcast-ready bytes
//!
//! # Data Flow
//! ```text
//! [ExecuteMsg] ──▶ TxBody ──┐
//!                           ├──▶ SignDoc ──▶ signer ──▶ TxRaw bytes
//! Account + Fee ▶ AuthInfo ─┘
//! ```
//!
//! # Design Decisions
//! - Body and auth info are encoded once and carried as bytes; the signature
//!   covers those exact bytes
//! - Fee and gas are configuration, independent of message count
//! - No I/O here; account and chain ID are supplied by the caller

use prost::Message;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::blockchain::types::{Account, ChainId};
use crate::blockchain::wallet::{WalletError, WalletKeyProvider, COMPRESSED_PUBKEY_LEN};
use crate::config::FeeConfig;
use crate::encoding::address::{self, AddressError};
use crate::encoding::proto::{
    Any, AuthInfo, Coin, Fee, ModeInfo, MsgExecuteContract, PubKey, SignDoc, SignerInfo, TxBody,
    TxRaw, MSG_EXECUTE_CONTRACT_TYPE_URL, SECP256K1_PUBKEY_TYPE_URL,
};

/// Errors raised while building a transaction.
#[derive(Debug, Error)]
pub enum TxBuildError {
    /// A sender or contract address failed to decode.
    #[error("message {index}: invalid {field} address: {source}")]
    InvalidAddress {
        index: usize,
        field: &'static str,
        #[source]
        source: AddressError,
    },

    /// Funds string is not `<amount><denom>[,<amount><denom>…]`.
    #[error("message {index}: unsupported funds format '{input}': {reason}")]
    UnsupportedFundsFormat {
        index: usize,
        input: String,
        reason: String,
    },

    /// The signer capability failed.
    #[error("signer failure: {0}")]
    SignerFailure(#[from] WalletError),

    /// No messages supplied.
    #[error("transaction has no messages")]
    EmptyBatch,
}

/// Result type for transaction building.
pub type TxBuildResult<T> = Result<T, TxBuildError>;

/// One encrypted contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteMsg {
    /// Bech32 sender.
    pub sender: String,
    /// Bech32 contract.
    pub contract: String,
    /// Code hash the payload was encrypted with. Kept for diagnostics; the
    /// hash itself travels inside the ciphertext.
    pub code_hash: Option<String>,
    /// Serialized encryption envelope.
    pub encrypted_payload: Vec<u8>,
    /// Funds sent with the call, e.g. `"1000uscrt"`.
    pub funds: Option<String>,
}

/// Body and auth info, encoded and ready to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
}

impl UnsignedTx {
    /// Encoded `SignDoc` for this transaction.
    pub fn sign_doc(&self, chain_id: &ChainId, account_number: u64) -> Vec<u8> {
        SignDoc {
            body_bytes: self.body_bytes.clone(),
            auth_info_bytes: self.auth_info_bytes.clone(),
            chain_id: chain_id.0.clone(),
            account_number,
        }
        .encode_to_vec()
    }

    /// Attach a signature.
    pub fn into_signed(self, signature: [u8; 64]) -> SignedTx {
        let bytes = TxRaw {
            body_bytes: self.body_bytes,
            auth_info_bytes: self.auth_info_bytes,
            signatures: vec![signature.to_vec()],
        }
        .encode_to_vec();
        SignedTx { bytes }
    }
}

/// Encoded `TxRaw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    bytes: Vec<u8>,
}

impl SignedTx {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Transaction hash as the chain reports it: upper-case hex SHA-256.
    pub fn hash(&self) -> String {
        hex::encode_upper(Sha256::digest(&self.bytes))
    }
}

/// Assembles signed transactions from encrypted contract calls.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    fee: FeeConfig,
    address_prefix: String,
}

impl TransactionBuilder {
    /// Create a new transaction builder.
    pub fn new(fee: FeeConfig, address_prefix: impl Into<String>) -> Self {
        Self {
            fee,
            address_prefix: address_prefix.into(),
        }
    }

    /// Build and sign a transaction.
    ///
    /// # Arguments
    /// * `messages` - Contract calls, in body order
    /// * `memo` - Free-form memo
    /// * `account` - Freshly fetched account number and sequence
    /// * `chain_id` - Chain the signature is bound to
    /// * `signer` - Wallet holding the secp256k1 key
    pub fn build(
        &self,
        messages: &[ExecuteMsg],
        memo: &str,
        account: Account,
        chain_id: &ChainId,
        signer: &dyn WalletKeyProvider,
    ) -> TxBuildResult<SignedTx> {
        let unsigned = self.build_unsigned(messages, memo, &signer.public_key(), account.sequence)?;
        let sign_doc = unsigned.sign_doc(chain_id, account.account_number);
        let signature = signer.sign(&sign_doc)?;

        let signed = unsigned.into_signed(signature);
        tracing::debug!(
            messages = messages.len(),
            sequence = account.sequence,
            tx_hash = %signed.hash(),
            "Transaction signed"
        );
        Ok(signed)
    }

    /// Encode body and auth info without signing.
    pub fn build_unsigned(
        &self,
        messages: &[ExecuteMsg],
        memo: &str,
        public_key: &[u8; COMPRESSED_PUBKEY_LEN],
        sequence: u64,
    ) -> TxBuildResult<UnsignedTx> {
        if messages.is_empty() {
            return Err(TxBuildError::EmptyBatch);
        }

        let wrapped = messages
            .iter()
            .enumerate()
            .map(|(index, msg)| self.wrap_execute(index, msg))
            .collect::<TxBuildResult<Vec<_>>>()?;

        let body = TxBody {
            messages: wrapped,
            memo: memo.to_string(),
            timeout_height: 0,
        };

        let auth_info = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(Any {
                    type_url: SECP256K1_PUBKEY_TYPE_URL.to_string(),
                    value: PubKey {
                        key: public_key.to_vec(),
                    }
                    .encode_to_vec(),
                }),
                mode_info: Some(ModeInfo::direct()),
                sequence,
            }],
            fee: Some(Fee {
                amount: vec![Coin {
                    denom: self.fee.denom.clone(),
                    amount: self.fee.amount.clone(),
                }],
                gas_limit: self.fee.gas_limit,
                payer: String::new(),
                granter: String::new(),
            }),
        };

        Ok(UnsignedTx {
            body_bytes: body.encode_to_vec(),
            auth_info_bytes: auth_info.encode_to_vec(),
        })
    }

    fn wrap_execute(&self, index: usize, msg: &ExecuteMsg) -> TxBuildResult<Any> {
        let sender = address::decode(&msg.sender, &self.address_prefix).map_err(|source| {
            TxBuildError::InvalidAddress {
                index,
                field: "sender",
                source,
            }
        })?;
        let contract = address::decode(&msg.contract, &self.address_prefix).map_err(|source| {
            TxBuildError::InvalidAddress {
                index,
                field: "contract",
                source,
            }
        })?;
        let sent_funds = match msg.funds.as_deref() {
            Some(funds) => {
                parse_funds(funds).map_err(|reason| TxBuildError::UnsupportedFundsFormat {
                    index,
                    input: funds.to_string(),
                    reason,
                })?
            }
            None => Vec::new(),
        };

        let execute = MsgExecuteContract {
            sender: sender.to_vec(),
            contract: contract.to_vec(),
            msg: msg.encrypted_payload.clone(),
            callback_code_hash: String::new(),
            sent_funds,
            callback_sig: Vec::new(),
        };

        Ok(Any {
            type_url: MSG_EXECUTE_CONTRACT_TYPE_URL.to_string(),
            value: execute.encode_to_vec(),
        })
    }
}

/// Parse `"1000uscrt"` or `"1000uscrt,5ibc/27394F…"` into coins.
///
/// An empty or whitespace-only string means no funds.
pub fn parse_funds(input: &str) -> Result<Vec<Coin>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_coin)
        .collect()
}

fn parse_coin(part: &str) -> Result<Coin, String> {
    let split = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
    let (amount, denom) = part.split_at(split);

    if amount.is_empty() {
        return Err(format!("'{}' has no amount", part));
    }
    if !is_valid_denom(denom) {
        return Err(format!("'{}' has an invalid denom", part));
    }
    Ok(Coin {
        denom: denom.to_string(),
        amount: amount.to_string(),
    })
}

// Cosmos SDK denom rule: [a-zA-Z][a-zA-Z0-9/:._-]{2,127}
fn is_valid_denom(denom: &str) -> bool {
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    first_ok
        && (3..=128).contains(&denom.len())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'))
}
