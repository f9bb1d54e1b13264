use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tx_stage::TxStage;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid stage transition from {from} to {to}")]
    InvalidStageTransition { from: TxStage, to: TxStage },

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid DID format: {0}")]
    InvalidDid(String),
}

/// Machine-readable classification of every failure the system reports.
///
/// Carried in transaction results, HTTP error bodies and CLI output so that
/// callers can tell a wrong password from tampered data without parsing
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadPassword,
    MissingPayload,
    MalformedDocument,
    CertificateMismatch,
    DigestMismatch,
    SignatureInvalid,
    UnparseableDate,
    UnverifiedCredential,
    SyncTimeout,
    IdentifierAlreadyRegistered,
    WalletAlreadyHasDid,
    IdentityBanned,
    ProofFailure,
    RegistryError,
    AdminRequired,
    WalletNotReady,
    Transport,
    Internal,
}

impl ErrorKind {
    /// Whether a failure of this kind is worth one automatic retry with a
    /// freshly drawn salt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::IdentifierAlreadyRegistered)
    }

    /// Whether this kind means the credential itself failed verification.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::CertificateMismatch | Self::DigestMismatch | Self::SignatureInvalid
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde names so logs and JSON agree.
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_owned))
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&name)
    }
}
