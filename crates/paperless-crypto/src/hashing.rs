use base64::Engine;
use paperless_core::Bytes32;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// 32-byte digest.
pub type Hash = [u8; 32];

/// SHA-256 of arbitrary data.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Standard base64 of the SHA-256 digest, as carried in `DigestValue`.
pub fn sha256_base64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(sha256(data))
}

/// SHA-1 of arbitrary data (XML-DSig `rsa-sha1` input).
pub fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

/// Wallet identity hash: SHA-256 over the UTF-8 bytes of the coin public
/// key's hex form.
pub fn wallet_hash(coin_public_key: &str) -> Bytes32 {
    Bytes32(sha256(coin_public_key.as_bytes()))
}

/// Registration nullifier: SHA-256(credential id || salt).
pub fn nullifier(credential_id: &Bytes32, salt: &Bytes32) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(credential_id.as_bytes());
    hasher.update(salt.as_bytes());
    Bytes32(hasher.finalize().into())
}

/// Derive a 32-byte key from a seed under a domain-separation context.
pub fn derive_key(context: &str, seed: &[u8]) -> Hash {
    blake3::derive_key(context, seed)
}
