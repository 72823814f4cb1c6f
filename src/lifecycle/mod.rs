//! Operation lifecycle.
//!
//! # Data Flow
//! ```text
//! Cancellation (context.rs) ──subscribe──▶ OperationContext per operation
//!                                            │ deadline + cancel flag
//!                                            ▼
//!                              every LCD request and poll sleep
//!
//! Signals (signals.rs):
//!     Ctrl-C → Cancellation::cancel
//! ```
//!
//! # Design Decisions
//! - One context per operation; contexts share nothing but the cancel flag
//! - Interruption surfaces as an error, never a panic

pub mod context;
pub mod signals;

pub use context::{Cancellation, Interrupt, OperationContext};
