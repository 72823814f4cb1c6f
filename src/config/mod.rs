//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → handed to ChainClient, TransactionBuilder, MessageCipher, Pipeline
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Network constants (consensus key, fee, gas) live here, not in code paths

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ConfirmationConfig;
pub use schema::FeeConfig;
pub use schema::LcdConfig;
pub use schema::NetworkConfig;
pub use schema::ObservabilityConfig;
pub use schema::OperationConfig;
pub use schema::PipelineConfig;
