//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Confirmation poll:
//!     → retries.rs (attempt cap + wall-clock window)
//!     → lifecycle::OperationContext (deadline, cancellation)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Only idempotent reads are retried; broadcasts never are
//! - A spent budget degrades to "no result", not an error

pub mod retries;

pub use retries::RetryBudget;
