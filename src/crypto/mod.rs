//! Contract message confidentiality.
//!
//! # Data Flow
//! ```text
//! wallet seed ──keys.rs──▶ x25519 keypair (stable per wallet)
//!                               │
//! fresh nonce ──────────────────┼──▶ cipher.rs: ECDH + HKDF ──▶ AES-SIV
//!                               ▼
//!                   nonce || pubkey || ciphertext
//! ```
//!
//! # Security Constraints
//! - Seeds, secrets and derived keys are zeroized on drop
//! - A nonce must never repeat for one wallet
//! - Plaintext is never logged

pub mod cipher;
pub mod keys;

pub use cipher::{CipherError, EncryptedEnvelope, MessageCipher, MessageEncryptor, Nonce};
pub use keys::{EncryptionKeyPair, EncryptionSeed};
