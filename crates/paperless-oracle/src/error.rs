//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use paperless_core::ErrorKind;
use paperless_credentials::{CredentialError, VerificationOutcome};

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or unreadable multipart field (400).
    #[error("{0}")]
    BadRequest(String),

    /// Extraction or witness failure (status by kind).
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Signature checks failed (401); details list every check.
    #[error("document signature verification failed")]
    Unverified(Box<VerificationOutcome>),

    /// Unexpected failure (500).
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unverified(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Credential(e) => match e.kind() {
                ErrorKind::BadPassword
                | ErrorKind::MissingPayload
                | ErrorKind::MalformedDocument
                | ErrorKind::UnparseableDate => StatusCode::BAD_REQUEST,
                kind if kind.is_verification_failure() => StatusCode::UNAUTHORIZED,
                ErrorKind::UnverifiedCredential => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::BadRequest(_) => None,
            Self::Credential(e) => Some(e.kind()),
            Self::Unverified(outcome) => Some(match outcome.as_ref().clone().into_result() {
                Err(e) => e.kind(),
                Ok(_) => ErrorKind::UnverifiedCredential,
            }),
            Self::Internal(_) => Some(ErrorKind::Internal),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        let (error, details) = match &self {
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    "Internal Server Error".to_string(),
                    Some(serde_json::Value::String(msg.clone())),
                )
            }
            Self::Unverified(outcome) => {
                tracing::warn!(failed = ?outcome.failed_checks(), "verification failed");
                (
                    self.to_string(),
                    serde_json::to_value(outcome.checks()).ok(),
                )
            }
            other => {
                tracing::warn!(error = %other, "request rejected");
                (other.to_string(), None)
            }
        };

        let body = ErrorBody {
            error,
            kind,
            details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperless_credentials::{verify, SignedXmlDocument};
    use paperless_crypto::TrustAnchor;

    const SAMPLE_XML: &str = include_str!("../../../tests/fixtures/sample_kyc.xml");
    const ISSUER_CERT: &str = include_str!("../../../tests/fixtures/issuer_cert.pem");

    /// Pinned and correctly signed, but with altered identity data.
    fn tampered_outcome() -> VerificationOutcome {
        let doc = SignedXmlDocument::parse(SAMPLE_XML.replace("Asha Verma", "Asha Varma")).unwrap();
        verify(&doc, &TrustAnchor::from_text("issuer", ISSUER_CERT).unwrap())
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(CredentialError::BadPassword("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CredentialError::MissingPayload).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CredentialError::DigestMismatch).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Unverified(Box::new(tampered_outcome())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unverified_kind_names_first_failure() {
        let err = AppError::Unverified(Box::new(tampered_outcome()));
        assert_eq!(err.kind(), Some(ErrorKind::DigestMismatch));
    }
}
