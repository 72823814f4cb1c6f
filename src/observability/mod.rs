//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, operation ID as a span field)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Operation ID flows through every log line of an operation
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
