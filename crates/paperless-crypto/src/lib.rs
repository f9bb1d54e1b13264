pub mod error;
pub mod hashing;
pub mod keys;
pub mod rsa_signature;
pub mod signing;
pub mod trust_anchor;

pub use error::CryptoError;
pub use hashing::{derive_key, nullifier, sha1, sha256, sha256_base64, wallet_hash, Hash};
pub use keys::{KeyPair, PublicKey};
pub use rsa_signature::{verify_rsa_sha1, CertificateKey};
pub use signing::{sign, verify, Signature};
pub use trust_anchor::{normalize_base64, TrustAnchor, TrustAnchorStore};
