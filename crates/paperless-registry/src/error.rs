use std::time::Duration;

use paperless_core::{CoreError, ErrorKind};
use paperless_credentials::CredentialError;

/// Registry, wallet and pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("wallet did not sync and fund within {0:?}")]
    SyncTimeout(Duration),

    #[error("{0}")]
    IdentifierAlreadyRegistered(String),

    #[error("{0}")]
    WalletAlreadyHasDid(String),

    #[error("{0}")]
    IdentityBanned(String),

    #[error("proof generation failed: {0}")]
    ProofFailure(String),

    #[error("registry error: {0}")]
    Registry(String),

    #[error("operation requires an admin wallet session")]
    AdminRequired,

    #[error("wallet session is not synced and funded")]
    WalletNotReady,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl RegistryError {
    /// Classify a rejection message returned by the registry contract.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains("Identity already registered") {
            Self::IdentifierAlreadyRegistered(message)
        } else if message.contains("Wallet already has a DID") {
            Self::WalletAlreadyHasDid(message)
        } else if message.contains("banned") {
            Self::IdentityBanned(message)
        } else {
            Self::Registry(message)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SyncTimeout(_) => ErrorKind::SyncTimeout,
            Self::IdentifierAlreadyRegistered(_) => ErrorKind::IdentifierAlreadyRegistered,
            Self::WalletAlreadyHasDid(_) => ErrorKind::WalletAlreadyHasDid,
            Self::IdentityBanned(_) => ErrorKind::IdentityBanned,
            Self::ProofFailure(_) => ErrorKind::ProofFailure,
            Self::Registry(_) => ErrorKind::RegistryError,
            Self::AdminRequired => ErrorKind::AdminRequired,
            Self::WalletNotReady => ErrorKind::WalletNotReady,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidInput(_) | Self::Core(_) => ErrorKind::Internal,
            Self::Credential(e) => e.kind(),
        }
    }
}
