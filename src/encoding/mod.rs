//! Wire encodings.
//!
//! # Data Flow
//! ```text
//! secret1… string ──address.rs──▶ [u8; 20] ──▶ MsgExecuteContract.sender/contract
//! encrypted envelope ───────────────────────▶ MsgExecuteContract.msg
//! proto.rs messages ── prost ──▶ body / auth info / sign doc / TxRaw bytes
//! ```

pub mod address;
pub mod proto;

pub use address::{AddressError, CanonicalAddress};
