//! Pipeline coordinator.
//!
//! # Data Flow
//! ```text
//! ExecuteRequest
//!     → validate (no I/O)
//!     → ChainClient: chain ID + account (fresh, concurrent)
//!     → MessageCipher: one envelope per call
//!     → TransactionBuilder: sign
//!     → ChainClient: broadcast → poll_confirmation (best effort)
//!     → ExecuteOutcome (responses decrypted with the retained nonces)
//!
//! QueryRequest
//!     → validate → code hash → encrypt → ChainClient::query_contract → decrypt
//! ```

pub mod coordinator;
pub mod error;
pub mod state;
pub mod types;

pub use coordinator::Pipeline;
pub use error::{PipelineError, PipelineResult};
pub use state::PipelineState;
pub use types::{ContractCall, ExecuteOutcome, ExecuteRequest, QueryRequest};
