//! Contract message encryption.
//!
//! # Envelope
//! ```text
//! nonce[32] || sender_x25519_pubkey[32] || aes_siv_ciphertext[N]
//! ```
//!
//! # Key schedule
//! ```text
//! shared = X25519(wallet_secret, consensus_io_pubkey)
//! tx_key = HKDF-SHA256(ikm = shared || nonce, salt = HKDF_SALT, info = "")
//! ct     = AES-SIV(tx_key, ad = [""], code_hash || msg)
//! ```
//! The nonce only feeds key derivation; AES-SIV needs no IV of its own.
//! Responses to a message are encrypted under the same `tx_key`, so callers
//! keep the nonce to decrypt them.

use aes_siv::siv::Aes128Siv;
use aes_siv::aead::KeyInit;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::keys::{EncryptionKeyPair, EncryptionSeed};

/// Envelope nonce length.
pub const NONCE_LEN: usize = 32;

/// x25519 public key length.
pub const PUBKEY_LEN: usize = 32;

/// Salt for the HKDF step, fixed by the network.
pub const HKDF_SALT: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x4b, 0xea, 0xd8, 0xdf, 0x69, 0x99,
    0x08, 0x52, 0xc2, 0x02, 0xdb, 0x0e, 0x00, 0x97, 0xc1, 0xa1, 0x2e, 0xa6, 0x37, 0xd7, 0xe9, 0x6d,
];

/// Mainnet consensus IO public key (`79++5YOHfm0SwhlpUDClv7cuCjq9xBZlWqSjDJWkRG8=`).
pub const MAINNET_CONSENSUS_IO_PUBKEY: [u8; 32] = [
    0xef, 0xdf, 0xbe, 0xe5, 0x83, 0x87, 0x7e, 0x6d, 0x12, 0xc2, 0x19, 0x69, 0x50, 0x30, 0xa5, 0xbf,
    0xb7, 0x2e, 0x0a, 0x3a, 0xbd, 0xc4, 0x16, 0x65, 0x5a, 0xa4, 0xa3, 0x0c, 0x95, 0xa4, 0x44, 0x6f,
];

/// The reference client seals with a single empty associated-data component.
const ASSOCIATED_DATA: [&[u8]; 1] = [&[]];

const ENCRYPTED_ERROR_MARKER: &str = "encrypted: ";

/// Per-message envelope nonce.
pub type Nonce = [u8; NONCE_LEN];

/// Errors raised by the cipher.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Network public key is not 32 bytes.
    #[error("invalid consensus IO key: {0}")]
    InvalidNetworkKey(String),

    /// Envelope shorter than nonce + public key.
    #[error("envelope too short: {0} bytes")]
    EnvelopeTooShort(usize),

    /// HKDF expansion failed.
    #[error("key derivation failed")]
    KeyDerivation,

    /// AES-SIV seal failed.
    #[error("AES-SIV encryption failed")]
    Encrypt,

    /// AES-SIV authentication failed (wrong nonce, wallet or tampered data).
    #[error("AES-SIV decryption failed")]
    Decrypt,

    /// Plaintext is not JSON under any supported wrapping.
    #[error("response is not valid JSON: {reason}")]
    Parse { reason: String, raw: String },
}

/// Result alias for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;

/// An encrypted contract message.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    nonce: Nonce,
    sender_pubkey: [u8; PUBKEY_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn sender_pubkey(&self) -> &[u8; PUBKEY_LEN] {
        &self.sender_pubkey
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serialize to the wire layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + PUBKEY_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sender_pubkey);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the wire layout.
    pub fn from_bytes(bytes: &[u8]) -> CipherResult<Self> {
        if bytes.len() < NONCE_LEN + PUBKEY_LEN {
            return Err(CipherError::EnvelopeTooShort(bytes.len()));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[..NONCE_LEN]);
        let mut sender_pubkey = [0u8; PUBKEY_LEN];
        sender_pubkey.copy_from_slice(&bytes[NONCE_LEN..NONCE_LEN + PUBKEY_LEN]);
        Ok(Self {
            nonce,
            sender_pubkey,
            ciphertext: bytes[NONCE_LEN + PUBKEY_LEN..].to_vec(),
        })
    }
}

impl fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("nonce", &hex::encode(self.nonce))
            .field("sender_pubkey", &hex::encode(self.sender_pubkey))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

/// Encryption capability used by the pipeline.
pub trait MessageEncryptor: Send + Sync {
    /// Encrypt `code_hash ++ plaintext_json` under a fresh nonce.
    fn encrypt(
        &self,
        code_hash: Option<&str>,
        plaintext_json: &str,
        seed: &EncryptionSeed,
    ) -> CipherResult<EncryptedEnvelope>;

    /// Decrypt a response ciphertext with the nonce of the originating message.
    fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        seed: &EncryptionSeed,
    ) -> CipherResult<Vec<u8>>;
}

/// AES-SIV message cipher bound to one network's consensus IO key.
#[derive(Clone)]
pub struct MessageCipher {
    consensus_io_pubkey: [u8; PUBKEY_LEN],
}

impl MessageCipher {
    pub fn new(consensus_io_pubkey: [u8; PUBKEY_LEN]) -> Self {
        Self { consensus_io_pubkey }
    }

    /// Build from a base64-encoded network key.
    pub fn from_base64(key: &str) -> CipherResult<Self> {
        let bytes = BASE64
            .decode(key.trim())
            .map_err(|e| CipherError::InvalidNetworkKey(e.to_string()))?;
        let key: [u8; PUBKEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CipherError::InvalidNetworkKey(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::new(key))
    }

    pub fn mainnet() -> Self {
        Self::new(MAINNET_CONSENSUS_IO_PUBKEY)
    }

    /// Encrypt with a caller-chosen nonce.
    ///
    /// Reusing a nonce with the same wallet reuses the symmetric key; only
    /// fixed-vector tests should call this directly.
    pub fn encrypt_with_nonce(
        &self,
        nonce: Nonce,
        code_hash: Option<&str>,
        plaintext_json: &str,
        seed: &EncryptionSeed,
    ) -> CipherResult<EncryptedEnvelope> {
        let keypair = EncryptionKeyPair::derive(seed);
        let key = self.tx_key(&keypair, &nonce)?;

        let mut plaintext = Zeroizing::new(Vec::with_capacity(
            code_hash.map_or(0, str::len) + plaintext_json.len(),
        ));
        if let Some(hash) = code_hash {
            plaintext.extend_from_slice(hash.as_bytes());
        }
        plaintext.extend_from_slice(plaintext_json.as_bytes());

        let mut siv = Aes128Siv::new_from_slice(key.as_slice()).map_err(|_| CipherError::Encrypt)?;
        let ciphertext = siv
            .encrypt(ASSOCIATED_DATA, &plaintext)
            .map_err(|_| CipherError::Encrypt)?;

        Ok(EncryptedEnvelope {
            nonce,
            sender_pubkey: keypair.public_key(),
            ciphertext,
        })
    }

    fn tx_key(
        &self,
        keypair: &EncryptionKeyPair,
        nonce: &Nonce,
    ) -> CipherResult<Zeroizing<[u8; 32]>> {
        let shared = keypair.shared_secret(&self.consensus_io_pubkey);

        let mut ikm = Zeroizing::new([0u8; 32 + NONCE_LEN]);
        ikm[..32].copy_from_slice(shared.as_slice());
        ikm[32..].copy_from_slice(nonce);

        let mut okm = Zeroizing::new([0u8; 32]);
        Hkdf::<Sha256>::new(Some(&HKDF_SALT), ikm.as_slice())
            .expand(&[], okm.as_mut_slice())
            .map_err(|_| CipherError::KeyDerivation)?;
        Ok(okm)
    }
}

impl MessageEncryptor for MessageCipher {
    fn encrypt(
        &self,
        code_hash: Option<&str>,
        plaintext_json: &str,
        seed: &EncryptionSeed,
    ) -> CipherResult<EncryptedEnvelope> {
        self.encrypt_with_nonce(random_nonce(), code_hash, plaintext_json, seed)
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        nonce: &Nonce,
        seed: &EncryptionSeed,
    ) -> CipherResult<Vec<u8>> {
        if ciphertext.is_empty() {
            return Ok(Vec::new());
        }
        let keypair = EncryptionKeyPair::derive(seed);
        let key = self.tx_key(&keypair, nonce)?;
        let mut siv = Aes128Siv::new_from_slice(key.as_slice()).map_err(|_| CipherError::Decrypt)?;
        siv.decrypt(ASSOCIATED_DATA, ciphertext)
            .map_err(|_| CipherError::Decrypt)
    }
}

impl fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageCipher")
            .field("consensus_io_pubkey", &BASE64.encode(self.consensus_io_pubkey))
            .finish()
    }
}

fn random_nonce() -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Interpret decrypted response bytes as JSON.
///
/// Empty input is `{}`. Otherwise the bytes are tried as JSON, then as
/// base64 text wrapping JSON.
pub fn decode_plaintext_json(bytes: &[u8]) -> CipherResult<serde_json::Value> {
    if bytes.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    let direct_err = match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let text = String::from_utf8_lossy(bytes);
    match BASE64.decode(text.trim()) {
        Ok(inner) if inner.is_empty() => Ok(serde_json::Value::Object(Default::default())),
        Ok(inner) => serde_json::from_slice(&inner).map_err(|e| CipherError::Parse {
            reason: format!("base64-wrapped payload: {}", e),
            raw: text.into_owned(),
        }),
        Err(_) => Err(CipherError::Parse {
            reason: direct_err.to_string(),
            raw: text.into_owned(),
        }),
    }
}

/// Pull the base64 ciphertext out of an `encrypted: <b64>: …` chain error.
pub fn extract_encrypted_error(log: &str) -> Option<Vec<u8>> {
    let start = log.find(ENCRYPTED_ERROR_MARKER)? + ENCRYPTED_ERROR_MARKER.len();
    let encoded: String = log[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .collect();
    if encoded.is_empty() {
        return None;
    }
    BASE64.decode(encoded).ok()
}
