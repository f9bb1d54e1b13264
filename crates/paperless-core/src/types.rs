use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CoreError;

/// A fixed 32-byte value: credential identifiers, salts, wallet hashes,
/// identity hashes and DIDs all travel in this shape.
///
/// Serializes as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Bytes32(pub [u8; 32]);

impl Bytes32 {
    /// All-zero value.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Draw 32 bytes from the OS RNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from a slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            CoreError::ValidationError(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Parse exactly 64 hex characters (an optional `0x` prefix is accepted).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let clean = strip_0x(s.trim());
        if clean.len() != 64 {
            return Err(CoreError::InvalidHex(format!(
                "expected 64 hex characters, got {}",
                clean.len()
            )));
        }
        let bytes = hex::decode(clean).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Parse hex of at most 64 characters, right-padding with `0` to a full
    /// 32 bytes. Registry inputs typed by operators are accepted this way.
    pub fn from_hex_padded(s: &str) -> Result<Self, CoreError> {
        let clean = strip_0x(s.trim());
        if clean.len() > 64 {
            return Err(CoreError::InvalidHex(format!(
                "at most 64 hex characters allowed, got {}",
                clean.len()
            )));
        }
        let mut padded = String::with_capacity(64);
        padded.push_str(clean);
        while padded.len() < 64 {
            padded.push('0');
        }
        let bytes = hex::decode(&padded).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

impl From<[u8; 32]> for Bytes32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Bytes32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bytes32({})", self.to_hex())
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Registry-issued decentralized identifier, bound to one wallet.
///
/// URI form: `did:midnight:<network>:<hex>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Did(pub Bytes32);

impl Did {
    /// Render the full DID URI for a network (e.g. `testnet`).
    pub fn uri(&self, network: &str) -> String {
        format!("did:midnight:{}:{}", network, self.0.to_hex())
    }

    /// Parse either a bare hex identifier or a full `did:midnight:` URI.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let input = input.trim();
        if let Some(rest) = input.strip_prefix("did:") {
            let parts: Vec<&str> = rest.split(':').collect();
            if parts.len() != 3 || parts[0] != "midnight" {
                return Err(CoreError::InvalidDid(format!(
                    "DID must have format 'did:midnight:<network>:<hex>', got: {}",
                    input
                )));
            }
            return Bytes32::from_hex(parts[2])
                .map(Self)
                .map_err(|e| CoreError::InvalidDid(e.to_string()));
        }
        Bytes32::from_hex_padded(input)
            .map(Self)
            .map_err(|e| CoreError::InvalidDid(e.to_string()))
    }

    /// The raw 32-byte identifier.
    pub fn id(&self) -> &Bytes32 {
        &self.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a wallet session acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// Contract owner: may ban, unban and revoke.
    Admin,
    /// Ordinary registrant.
    User,
}

impl WalletRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for WalletRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::User => write!(f, "User"),
        }
    }
}
