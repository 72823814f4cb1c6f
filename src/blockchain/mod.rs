//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! WalletKeyProvider (address, pubkey, signer, encryption seed)
//!     → client.rs (LCD: chain ID, account, code hash)
//!     → transaction.rs (build, sign)
//!     → client.rs (broadcast, confirm, query)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables or the host's provider
//! - Never log private keys, seeds or plaintext messages
//! - All LCD calls have configurable timeouts
//! - Confirmation failures degrade to the broadcast result

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use crate::encoding::proto::Coin;
pub use client::ChainClient;
pub use transaction::{ExecuteMsg, SignedTx, TransactionBuilder, TxBuildError, UnsignedTx};
pub use types::{Account, BroadcastResult, ChainClientError, ChainId, ConfirmedTx, TxStatus};
pub use wallet::{LocalWallet, WalletError, WalletKeyProvider};
