//! Wallet key material and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables or explicit
//!   caller input
//! - Keys are never logged or serialized
//! - Key material is borrowed per operation and not retained by the pipeline

use k256::ecdsa::signature::Signer;
use k256::ecdsa::{Signature, SigningKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::EncryptionSeed;
use crate::encoding::address::{self, AddressError, CanonicalAddress, DEFAULT_PREFIX};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "SECRET_TX_PRIVATE_KEY";

/// Compressed secp256k1 public key length.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

/// Errors raised by key providers.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Invalid private key format.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Environment variable missing.
    #[error("environment variable {0} not set")]
    MissingEnv(&'static str),

    /// Signer refused or failed.
    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// Signing and encryption capability supplied by the host.
///
/// Mnemonic handling and secure storage stay with the implementor; the
/// pipeline only asks for what one operation needs.
pub trait WalletKeyProvider: Send + Sync {
    /// Bech32 account address.
    fn address(&self) -> &str;

    /// Compressed secp256k1 public key.
    fn public_key(&self) -> [u8; COMPRESSED_PUBKEY_LEN];

    /// 64-byte `r || s` low-S ECDSA signature over SHA-256(`sign_doc`).
    fn sign(&self, sign_doc: &[u8]) -> WalletResult<[u8; 64]>;

    /// Seed the contract-message encryption keypair is derived from.
    fn encryption_seed(&self) -> EncryptionSeed;
}

/// In-process wallet backed by a raw secp256k1 key.
pub struct LocalWallet {
    signing_key: SigningKey,
    public_key: [u8; COMPRESSED_PUBKEY_LEN],
    address: String,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `prefix` - Bech32 prefix of the derived address
    pub fn from_private_key(private_key_hex: &str, prefix: &str) -> WalletResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let bytes = Zeroizing::new(
            hex::decode(key_hex).map_err(|e| WalletError::InvalidKey(format!("not hex: {}", e)))?,
        );
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| WalletError::InvalidKey("not a valid secp256k1 scalar".to_string()))?;

        let point = signing_key.verifying_key().to_encoded_point(true);
        let mut public_key = [0u8; COMPRESSED_PUBKEY_LEN];
        public_key.copy_from_slice(point.as_bytes());

        let address = address::encode(&account_address(&public_key), prefix)?;

        tracing::info!(address = %address, "Wallet initialized");

        Ok(Self {
            signing_key,
            public_key,
            address,
        })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `SECRET_TX_PRIVATE_KEY` from environment.
    pub fn from_env(prefix: &str) -> WalletResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR)
            .map_err(|_| WalletError::MissingEnv(PRIVATE_KEY_ENV_VAR))?;
        let private_key = Zeroizing::new(private_key);
        Self::from_private_key(&private_key, prefix)
    }

    /// Mainnet-prefixed wallet.
    pub fn from_private_key_default(private_key_hex: &str) -> WalletResult<Self> {
        Self::from_private_key(private_key_hex, DEFAULT_PREFIX)
    }
}

impl WalletKeyProvider for LocalWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn public_key(&self) -> [u8; COMPRESSED_PUBKEY_LEN] {
        self.public_key
    }

    fn sign(&self, sign_doc: &[u8]) -> WalletResult<[u8; 64]> {
        let signature: Signature = self
            .signing_key
            .try_sign(sign_doc)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        let signature = signature.normalize_s().unwrap_or(signature);

        let mut out = [0u8; 64];
        out.copy_from_slice(&signature.to_bytes());
        Ok(out)
    }

    fn encryption_seed(&self) -> EncryptionSeed {
        EncryptionSeed::new(self.signing_key.to_bytes().to_vec())
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Account address bytes: RIPEMD-160(SHA-256(compressed pubkey)).
pub fn account_address(public_key: &[u8; COMPRESSED_PUBKEY_LEN]) -> CanonicalAddress {
    let sha = Sha256::digest(public_key);
    let mut out = [0u8; address::CANONICAL_ADDRESS_LEN];
    out.copy_from_slice(&Ripemd160::digest(sha));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::signature::Verifier;
    use k256::ecdsa::VerifyingKey;

    // Well-known test private key
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(wallet.address(), "secret15428vq2uzwhm3taey9sr9x5vm6tk78ewm3pkn9");
        assert_eq!(
            hex::encode(wallet.public_key()),
            "038318535b54105d4a7aae60c08fc45f9687181b4fdfc625bd1a753fa7397fed75"
        );
    }

    #[test]
    fn test_wallet_with_0x_prefix() {
        let wallet =
            LocalWallet::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY), "secret").unwrap();
        assert_eq!(wallet.address(), "secret15428vq2uzwhm3taey9sr9x5vm6tk78ewm3pkn9");
    }

    #[test]
    fn test_account_address_bytes() {
        let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            hex::encode(account_address(&wallet.public_key())),
            "a55476015c13afb8afb92160329a8cde976f1f2e"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = LocalWallet::from_private_key_default("invalid_key");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid private key"));

        let zero = "00".repeat(32);
        assert!(matches!(
            LocalWallet::from_private_key_default(&zero),
            Err(WalletError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_sign_is_low_s_and_verifies() {
        let wallet = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();
        let doc = b"sign doc bytes";
        let sig_bytes = wallet.sign(doc).unwrap();

        let signature = Signature::from_slice(&sig_bytes).unwrap();
        assert!(signature.normalize_s().is_none());

        let vk = VerifyingKey::from_sec1_bytes(&wallet.public_key()).unwrap();
        assert!(vk.verify(doc, &signature).is_ok());
    }

    #[test]
    fn test_encryption_seed_is_stable() {
        let a = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();
        let b = LocalWallet::from_private_key_default(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(a.encryption_seed().as_bytes(), b.encryption_seed().as_bytes());
    }
}
