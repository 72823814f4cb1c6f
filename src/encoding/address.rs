//! Bech32 address codec.
//!
//! Converts `secret1…` account and contract addresses to the 20-byte
//! canonical form carried in protobuf messages, and back.
//!
//! # Decode steps
//! 1. Split the human-readable prefix from the data part at the last `1`.
//! 2. Map every data character through the bech32 alphabet.
//! 3. Verify the 6-symbol BIP-173 checksum.
//! 4. Regroup the 5-bit symbols into bytes (strict: no non-zero padding).

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use thiserror::Error;

/// Length of a canonical account or contract address.
pub const CANONICAL_ADDRESS_LEN: usize = 20;

/// Default human-readable prefix for Secret Network addresses.
pub const DEFAULT_PREFIX: &str = "secret";

const CHECKSUM_LEN: usize = 6;
const ALPHABET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Canonical 20-byte address.
pub type CanonicalAddress = [u8; CANONICAL_ADDRESS_LEN];

/// Reasons an address fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The separator or data part is missing.
    #[error("malformed address '{0}'")]
    Malformed(String),

    /// Human-readable prefix does not match the network.
    #[error("wrong address prefix: expected '{expected}', got '{found}'")]
    WrongPrefix { expected: String, found: String },

    /// A character outside the bech32 alphabet.
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    /// Upper and lower case characters are mixed.
    #[error("mixed-case address")]
    MixedCase,

    /// Checksum does not verify.
    #[error("invalid bech32 checksum")]
    InvalidChecksum,

    /// Regrouping left more than 4 bits or non-zero padding.
    #[error("invalid bit padding in address payload")]
    InvalidPadding,

    /// Payload decoded to the wrong number of bytes.
    #[error("invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Encoding failed (bad prefix supplied by the caller).
    #[error("cannot encode address: {0}")]
    Encode(String),
}

/// Result alias for address operations.
pub type AddressResult<T> = Result<T, AddressError>;

/// Decode a bech32 address with the expected prefix into its 20 bytes.
pub fn decode(address: &str, expected_prefix: &str) -> AddressResult<CanonicalAddress> {
    let has_lower = address.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = address.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(AddressError::MixedCase);
    }
    let normalized = address.to_ascii_lowercase();

    let (prefix, data) = normalized
        .rsplit_once('1')
        .ok_or_else(|| AddressError::Malformed(address.to_string()))?;

    if prefix != expected_prefix {
        return Err(AddressError::WrongPrefix {
            expected: expected_prefix.to_string(),
            found: prefix.to_string(),
        });
    }
    if data.len() < CHECKSUM_LEN {
        return Err(AddressError::Malformed(address.to_string()));
    }

    let symbols = data
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            ALPHABET
                .iter()
                .position(|&a| a == b)
                .map(|p| p as u8)
                .ok_or(AddressError::InvalidCharacter {
                    ch: b as char,
                    position: prefix.len() + 1 + i,
                })
        })
        .collect::<AddressResult<Vec<u8>>>()?;

    CheckedHrpstring::new::<Bech32>(&normalized).map_err(|_| AddressError::InvalidChecksum)?;

    let payload = regroup_strict(&symbols[..symbols.len() - CHECKSUM_LEN])?;
    if payload.len() != CANONICAL_ADDRESS_LEN {
        return Err(AddressError::InvalidLength {
            expected: CANONICAL_ADDRESS_LEN,
            actual: payload.len(),
        });
    }

    let mut out = [0u8; CANONICAL_ADDRESS_LEN];
    out.copy_from_slice(&payload);
    Ok(out)
}

/// Encode 20 canonical bytes as a bech32 address with the given prefix.
pub fn encode(bytes: &CanonicalAddress, prefix: &str) -> AddressResult<String> {
    let hrp = Hrp::parse(prefix).map_err(|e| AddressError::Encode(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, bytes).map_err(|e| AddressError::Encode(e.to_string()))
}

/// Convert 5-bit symbols to bytes, rejecting leftover non-zero bits.
fn regroup_strict(symbols: &[u8]) -> AddressResult<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(symbols.len() * 5 / 8);

    for &s in symbols {
        acc = (acc << 5) | u32::from(s);
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }

    if bits >= 5 || (acc & ((1 << bits) - 1)) != 0 {
        return Err(AddressError::InvalidPadding);
    }
    Ok(out)
}
