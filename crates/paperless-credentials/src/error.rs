use paperless_core::ErrorKind;

/// Credential extraction, verification and witness errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("bad password: {0}")]
    BadPassword(String),

    #[error("archive contains no .xml entry")]
    MissingPayload,

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("embedded certificate does not match any trusted anchor")]
    CertificateMismatch,

    #[error("digest mismatch: signed content does not hash to the declared DigestValue")]
    DigestMismatch,

    #[error("signature over SignedInfo is invalid")]
    SignatureInvalid,

    #[error("unparseable date of birth: {0}")]
    UnparseableDate(String),

    #[error("credential is not verified: {0}")]
    UnverifiedCredential(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] paperless_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl CredentialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadPassword(_) => ErrorKind::BadPassword,
            Self::MissingPayload => ErrorKind::MissingPayload,
            Self::MalformedDocument(_) | Self::Serialization(_) => ErrorKind::MalformedDocument,
            Self::CertificateMismatch => ErrorKind::CertificateMismatch,
            Self::DigestMismatch => ErrorKind::DigestMismatch,
            Self::SignatureInvalid => ErrorKind::SignatureInvalid,
            Self::UnparseableDate(_) => ErrorKind::UnparseableDate,
            Self::UnverifiedCredential(_) => ErrorKind::UnverifiedCredential,
            Self::Crypto(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(CredentialError::MissingPayload.kind(), ErrorKind::MissingPayload);
        assert_eq!(
            CredentialError::BadPassword("x".into()).kind(),
            ErrorKind::BadPassword
        );
        assert!(CredentialError::DigestMismatch.kind().is_verification_failure());
        assert!(!CredentialError::UnparseableDate("x".into())
            .kind()
            .is_verification_failure());
    }
}
