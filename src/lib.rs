//! Confidential transaction client for Secret Network.
//!
//! # Architecture
//! ```text
//! ExecuteRequest ─▶ pipeline ─▶ crypto (encrypt per call)
//!                      │     ─▶ blockchain::TransactionBuilder (encode + sign)
//!                      │     ─▶ blockchain::ChainClient (LCD: account, broadcast, confirm)
//!                      ▼
//!                ExecuteOutcome (decrypted responses)
//! ```

pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod resilience;

pub use config::schema::PipelineConfig;
pub use lifecycle::OperationContext;
pub use pipeline::Pipeline;
