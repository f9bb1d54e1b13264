use base64::Engine;
use serde::{Deserialize, Serialize};

use paperless_core::Bytes32;
use paperless_crypto::{hashing, verify_rsa_sha1, TrustAnchor, TrustAnchorStore};

use crate::document::SignedXmlDocument;
use crate::error::CredentialError;

pub const CHECK_CERTIFICATE_TRUSTED: &str = "certificate_trusted";
pub const CHECK_DIGEST_MATCHES: &str = "digest_matches";
pub const CHECK_SIGNATURE_VALID: &str = "signature_valid";

/// An individual verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl VerificationCheck {
    fn new(name: &str, passed: bool, failure_detail: impl FnOnce() -> String) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: if passed { None } else { Some(failure_detail()) },
        }
    }
}

/// Result of verifying a signed document against pinned anchors.
///
/// All three flags are always present. A certificate mismatch leaves the
/// other two `false` without computing them. Only [`verify`] and
/// [`verify_with_store`] produce outcomes, and each one stays bound to the
/// document it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    certificate_trusted: bool,
    digest_matches: bool,
    signature_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    anchor: Option<String>,
    checks: Vec<VerificationCheck>,
    #[serde(skip)]
    document: Option<Bytes32>,
}

impl VerificationOutcome {
    /// Build an unbound outcome from the three flags, with generic check
    /// details.
    pub(crate) fn new(certificate_trusted: bool, digest_matches: bool, signature_valid: bool) -> Self {
        Self {
            certificate_trusted,
            digest_matches,
            signature_valid,
            anchor: None,
            checks: vec![
                VerificationCheck::new(CHECK_CERTIFICATE_TRUSTED, certificate_trusted, || {
                    "certificate not pinned".into()
                }),
                VerificationCheck::new(CHECK_DIGEST_MATCHES, digest_matches, || {
                    "digest mismatch".into()
                }),
                VerificationCheck::new(CHECK_SIGNATURE_VALID, signature_valid, || {
                    "signature invalid".into()
                }),
            ],
            document: None,
        }
    }

    pub(crate) fn bound_to(mut self, doc: &SignedXmlDocument) -> Self {
        self.document = Some(doc.fingerprint());
        self
    }

    pub fn certificate_trusted(&self) -> bool {
        self.certificate_trusted
    }

    pub fn digest_matches(&self) -> bool {
        self.digest_matches
    }

    pub fn signature_valid(&self) -> bool {
        self.signature_valid
    }

    /// Name of the anchor the embedded certificate matched.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn checks(&self) -> &[VerificationCheck] {
        &self.checks
    }

    /// Whether this outcome was computed for exactly `doc`.
    pub fn is_for(&self, doc: &SignedXmlDocument) -> bool {
        self.document == Some(doc.fingerprint())
    }

    pub fn overall_valid(&self) -> bool {
        self.certificate_trusted && self.digest_matches && self.signature_valid
    }

    /// Names of the checks that failed, in evaluation order.
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Turn the outcome into an error naming the first failed check.
    pub fn into_result(self) -> Result<Self, CredentialError> {
        if !self.certificate_trusted {
            Err(CredentialError::CertificateMismatch)
        } else if !self.digest_matches {
            Err(CredentialError::DigestMismatch)
        } else if !self.signature_valid {
            Err(CredentialError::SignatureInvalid)
        } else {
            Ok(self)
        }
    }

    fn untrusted() -> Self {
        Self {
            certificate_trusted: false,
            digest_matches: false,
            signature_valid: false,
            anchor: None,
            checks: vec![VerificationCheck::new(CHECK_CERTIFICATE_TRUSTED, false, || {
                "embedded certificate does not match any pinned anchor".into()
            })],
            document: None,
        }
    }
}

/// Verify a document against a single pinned anchor.
pub fn verify(doc: &SignedXmlDocument, anchor: &TrustAnchor) -> VerificationOutcome {
    if !anchor.matches(doc.x509_certificate()) {
        tracing::warn!(
            anchor = anchor.name(),
            reference_id = doc.reference_id().unwrap_or("-"),
            "certificate mismatch"
        );
        return VerificationOutcome::untrusted().bound_to(doc);
    }
    verify_pinned(doc, anchor)
}

/// Verify a document against whichever anchor in the store matches its
/// embedded certificate.
pub fn verify_with_store(doc: &SignedXmlDocument, store: &TrustAnchorStore) -> VerificationOutcome {
    match store.find(doc.x509_certificate()) {
        Some(anchor) => verify_pinned(doc, anchor),
        None => {
            tracing::warn!(
                anchors = store.len(),
                reference_id = doc.reference_id().unwrap_or("-"),
                "certificate matches no pinned anchor"
            );
            VerificationOutcome::untrusted().bound_to(doc)
        }
    }
}

fn verify_pinned(doc: &SignedXmlDocument, anchor: &TrustAnchor) -> VerificationOutcome {
    let mut checks = vec![VerificationCheck {
        name: CHECK_CERTIFICATE_TRUSTED.into(),
        passed: true,
        detail: None,
    }];

    let computed = hashing::sha256_base64(doc.canonical_signed_data().as_bytes());
    let digest_matches = computed == doc.digest_value();
    checks.push(VerificationCheck::new(CHECK_DIGEST_MATCHES, digest_matches, || {
        format!("declared {}, computed {computed}", doc.digest_value())
    }));

    let signature_result = check_signature(doc, anchor);
    let signature_valid = signature_result.is_ok();
    checks.push(VerificationCheck::new(CHECK_SIGNATURE_VALID, signature_valid, || {
        signature_result.err().unwrap_or_default()
    }));

    let outcome = VerificationOutcome {
        certificate_trusted: true,
        digest_matches,
        signature_valid,
        anchor: Some(anchor.name().to_string()),
        checks,
        document: Some(doc.fingerprint()),
    };

    if outcome.overall_valid() {
        tracing::info!(
            anchor = anchor.name(),
            reference_id = doc.reference_id().unwrap_or("-"),
            "offline KYC signature verified"
        );
    } else {
        tracing::warn!(
            anchor = anchor.name(),
            digest_matches,
            signature_valid,
            "offline KYC verification failed"
        );
    }
    outcome
}

fn check_signature(doc: &SignedXmlDocument, anchor: &TrustAnchor) -> Result<(), String> {
    let signature = base64::engine::general_purpose::STANDARD
        .decode(doc.signature_value())
        .map_err(|e| format!("SignatureValue is not base64: {e}"))?;
    let key = anchor
        .public_key()
        .map_err(|e| format!("pinned certificate unusable: {e}"))?;
    verify_rsa_sha1(&key, doc.canonical_signed_info().as_bytes(), &signature)
        .map_err(|_| "RSA-SHA1 verification over SignedInfo failed".to_string())
}
