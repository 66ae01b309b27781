//! SHA-256 primitives and hex conversion helpers.
//!
//! `hash_pair` is the single building block the Merkle verifier folds
//! repeatedly; operand order is significant (`hash_pair(a, b) != hash_pair(b, a)`
//! in general).

use crate::error::{AuditError, Result};
use sha2::{Digest, Sha256};

pub const DIGEST_LEN: usize = 32;

pub type Digest32 = [u8; DIGEST_LEN];

pub fn hash_bytes(data: &[u8]) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let out = hasher.finalize();
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&out);
    digest
}

pub fn hash_pair(left: &Digest32, right: &Digest32) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    let out = hasher.finalize();
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&out);
    digest
}

pub fn hash_hex(data: &[u8]) -> String {
    encode_hex(&hash_bytes(data))
}

pub fn encode_hex(digest: &Digest32) -> String {
    hex::encode(digest)
}

pub fn decode_hex(s: &str) -> Result<Digest32> {
    let bytes = hex::decode(s)
        .map_err(|e| AuditError::DecodeError(format!("invalid hex '{s}': {e}")))?;
    if bytes.len() != DIGEST_LEN {
        return Err(AuditError::DecodeError(format!(
            "expected {DIGEST_LEN}-byte digest, got {} bytes",
            bytes.len()
        )));
    }
    let mut digest = [0u8; DIGEST_LEN];
    digest.copy_from_slice(&bytes);
    Ok(digest)
}
