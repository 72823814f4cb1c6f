//! Wallet encryption keys.
//!
//! The x25519 keypair used for contract message encryption is derived from
//! the wallet seed supplied by the key provider. The same seed always yields
//! the same keypair; per-message freshness comes from the envelope nonce.

use sha2::{Digest, Sha256};
use std::fmt;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Domain separation prefix hashed in front of the wallet seed.
pub const ENCRYPTION_SEED_DOMAIN: &[u8] = b"secret-tx/encryption-seed/v1";

/// Wallet seed material handed in by the key provider for one call.
///
/// Wiped from memory on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionSeed(Vec<u8>);

impl EncryptionSeed {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionSeed(<redacted>)")
    }
}

/// Deterministic x25519 keypair for one wallet.
pub struct EncryptionKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EncryptionKeyPair {
    /// Derive the keypair: `clamp(SHA-256(domain || seed))`.
    pub fn derive(seed: &EncryptionSeed) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ENCRYPTION_SEED_DOMAIN);
        hasher.update(seed.as_bytes());
        let mut scalar: Zeroizing<[u8; 32]> = Zeroizing::new(hasher.finalize().into());
        clamp(&mut scalar);

        let secret = StaticSecret::from(*scalar);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public half, embedded in every envelope.
    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Diffie-Hellman with a peer public key.
    pub fn shared_secret(&self, peer: &[u8; 32]) -> Zeroizing<[u8; 32]> {
        let shared = self.secret.diffie_hellman(&PublicKey::from(*peer));
        Zeroizing::new(shared.to_bytes())
    }
}

impl fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

fn clamp(scalar: &mut [u8; 32]) {
    scalar[0] &= 248;
    scalar[31] &= 127;
    scalar[31] |= 64;
}
