use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use paperless_core::Bytes32;
use paperless_crypto::{signing, KeyPair, PublicKey};

use crate::document::SignedXmlDocument;
use crate::eligibility::IdentityAttributes;
use crate::error::CredentialError;
use crate::verifier::VerificationOutcome;

/// Credential fields fed to the registration circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCredential {
    pub id: Bytes32,
    pub is_eligible: bool,
    pub salt: Bytes32,
}

/// Circuit witness for registration.
///
/// JSON shape: `{"student_credential": {"id", "is_eligible", "salt"},
/// "issuer_signature"}` with every byte field hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub student_credential: StudentCredential,
    #[serde(with = "hex_bytes")]
    pub issuer_signature: Vec<u8>,
}

impl Witness {
    pub fn credential_id(&self) -> &Bytes32 {
        &self.student_credential.id
    }

    pub fn salt(&self) -> &Bytes32 {
        &self.student_credential.salt
    }

    pub fn is_eligible(&self) -> bool {
        self.student_credential.is_eligible
    }

    /// Same credential with a newly drawn salt, for a fresh attempt.
    pub fn with_fresh_salt(&self) -> Self {
        let mut next = self.clone();
        next.student_credential.salt = Bytes32::random();
        next
    }

    pub fn to_json(&self) -> Result<String, CredentialError> {
        serde_json::to_string_pretty(self).map_err(|e| CredentialError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        serde_json::from_str(json).map_err(|e| CredentialError::Serialization(e.to_string()))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

/// Where the witness's issuer signature comes from.
pub enum IssuerSignatureSource {
    /// Ed25519 signature over the credential id, made by the oracle's key.
    Oracle(KeyPair),
    /// The document's own verified `SignatureValue`.
    Document,
}

/// Builds witnesses from verified documents.
pub struct WitnessBuilder {
    source: IssuerSignatureSource,
    reference_date: Option<NaiveDate>,
}

impl WitnessBuilder {
    pub fn new(source: IssuerSignatureSource) -> Self {
        Self {
            source,
            reference_date: None,
        }
    }

    /// Online oracle variant.
    pub fn oracle(key: KeyPair) -> Self {
        Self::new(IssuerSignatureSource::Oracle(key))
    }

    /// Offline variant.
    pub fn offline() -> Self {
        Self::new(IssuerSignatureSource::Document)
    }

    /// Fix the date ages are computed against. Defaults to today (UTC).
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Public key witnesses are signed with, if this is an oracle builder.
    pub fn issuer_public_key(&self) -> Option<PublicKey> {
        match &self.source {
            IssuerSignatureSource::Oracle(key) => Some(key.public_key()),
            IssuerSignatureSource::Document => None,
        }
    }

    /// Derive the document's identity attributes.
    pub fn attributes(&self, doc: &SignedXmlDocument) -> Result<IdentityAttributes, CredentialError> {
        match self.reference_date {
            Some(date) => IdentityAttributes::derive(doc, date),
            None => IdentityAttributes::derive_now(doc),
        }
    }

    /// Build a witness with a fresh salt. Refuses any outcome that is not
    /// fully valid.
    pub fn build(
        &self,
        doc: &SignedXmlDocument,
        outcome: &VerificationOutcome,
    ) -> Result<Witness, CredentialError> {
        if !outcome.overall_valid() {
            let failed = outcome.failed_checks().join(", ");
            tracing::warn!(failed = %failed, "refusing to build witness from unverified credential");
            return Err(CredentialError::UnverifiedCredential(failed));
        }
        if !outcome.is_for(doc) {
            tracing::warn!(
                reference_id = doc.reference_id().unwrap_or("-"),
                "refusing to build witness: outcome belongs to a different document"
            );
            return Err(CredentialError::UnverifiedCredential(
                "verification outcome was not produced for this document".into(),
            ));
        }

        let attributes = self.attributes(doc)?;
        let credential_id = attributes.mobile_number_hash;
        let issuer_signature = match &self.source {
            IssuerSignatureSource::Oracle(key) => {
                signing::sign(credential_id.as_bytes(), key).to_bytes().to_vec()
            }
            IssuerSignatureSource::Document => base64::engine::general_purpose::STANDARD
                .decode(doc.signature_value())
                .map_err(|e| {
                    CredentialError::MalformedDocument(format!("SignatureValue is not base64: {e}"))
                })?,
        };

        tracing::info!(
            credential = %credential_id.short(),
            is_eligible = attributes.is_eligible,
            "witness built"
        );

        Ok(Witness {
            student_credential: StudentCredential {
                id: credential_id,
                is_eligible: attributes.is_eligible,
                salt: Bytes32::random(),
            },
            issuer_signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        "<OfflinePaperlessKyc referenceId=\"1\"><UidData><Poi dob=\"15-05-2000\" m=\"abc\"/></UidData>",
        "<Signature><SignedInfo><DigestValue>AAAA</DigestValue></SignedInfo>",
        "<SignatureValue>c2lnbmF0dXJl</SignatureValue>",
        "<KeyInfo><X509Data><X509Certificate>Q0VSVA==</X509Certificate></X509Data></KeyInfo>",
        "</Signature></OfflinePaperlessKyc>"
    );

    fn doc() -> SignedXmlDocument {
        SignedXmlDocument::parse(DOC).unwrap()
    }

    fn valid(doc: &SignedXmlDocument) -> VerificationOutcome {
        VerificationOutcome::new(true, true, true).bound_to(doc)
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_rejects_any_failed_check() {
        let builder = WitnessBuilder::offline().with_reference_date(reference());
        for flags in [
            (false, true, true),
            (true, false, true),
            (true, true, false),
            (false, false, false),
        ] {
            let outcome = VerificationOutcome::new(flags.0, flags.1, flags.2).bound_to(&doc());
            assert!(
                matches!(
                    builder.build(&doc(), &outcome),
                    Err(CredentialError::UnverifiedCredential(_))
                ),
                "{flags:?}"
            );
        }
    }

    #[test]
    fn test_rejects_outcome_of_another_document() {
        let builder = WitnessBuilder::offline().with_reference_date(reference());
        let other = SignedXmlDocument::parse(DOC.replace("m=\"abc\"", "m=\"abd\"")).unwrap();

        let err = builder.build(&other, &valid(&doc())).unwrap_err();
        assert!(matches!(err, CredentialError::UnverifiedCredential(_)));

        let unbound = VerificationOutcome::new(true, true, true);
        assert!(matches!(
            builder.build(&doc(), &unbound),
            Err(CredentialError::UnverifiedCredential(_))
        ));
    }

    #[test]
    fn test_oracle_witness_signs_credential_id() {
        let key = KeyPair::generate();
        let builder = WitnessBuilder::oracle(key).with_reference_date(reference());
        let witness = builder
            .build(&doc(), &valid(&doc()))
            .unwrap();

        let expected_id = Bytes32(paperless_crypto::sha256(b"abc"));
        assert_eq!(witness.credential_id(), &expected_id);
        assert!(witness.is_eligible());

        let signature = signing::Signature::from_bytes(&witness.issuer_signature).unwrap();
        let public_key = builder.issuer_public_key().unwrap();
        assert!(signing::verify(expected_id.as_bytes(), &signature, &public_key).is_ok());
    }

    #[test]
    fn test_offline_witness_uses_document_signature() {
        let witness = WitnessBuilder::offline()
            .with_reference_date(reference())
            .build(&doc(), &valid(&doc()))
            .unwrap();
        assert_eq!(witness.issuer_signature, b"signature".to_vec());
    }

    #[test]
    fn test_salts_differ_per_build() {
        let builder = WitnessBuilder::offline().with_reference_date(reference());
        let outcome = valid(&doc());
        let a = builder.build(&doc(), &outcome).unwrap();
        let b = builder.build(&doc(), &outcome).unwrap();
        assert_eq!(a.credential_id(), b.credential_id());
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.with_fresh_salt().salt(), a.salt());
    }

    #[test]
    fn test_minor_is_not_eligible() {
        let xml = DOC.replace("15-05-2000", "2010-01-01");
        let doc = SignedXmlDocument::parse(xml).unwrap();
        let witness = WitnessBuilder::offline()
            .with_reference_date(reference())
            .build(&doc, &valid(&doc))
            .unwrap();
        assert!(!witness.is_eligible());
    }

    #[test]
    fn test_unparseable_dob_fails_build() {
        let xml = DOC.replace("15-05-2000", "15/05/2000");
        let doc = SignedXmlDocument::parse(xml).unwrap();
        let result = WitnessBuilder::offline()
            .with_reference_date(reference())
            .build(&doc, &valid(&doc));
        assert!(matches!(result, Err(CredentialError::UnparseableDate(_))));
    }

    #[test]
    fn test_json_shape() {
        let witness = Witness {
            student_credential: StudentCredential {
                id: Bytes32([0x01; 32]),
                is_eligible: true,
                salt: Bytes32([0x02; 32]),
            },
            issuer_signature: vec![0xab, 0xcd],
        };
        let value: serde_json::Value = serde_json::from_str(&witness.to_json().unwrap()).unwrap();
        assert_eq!(value["student_credential"]["id"], "01".repeat(32));
        assert_eq!(value["student_credential"]["is_eligible"], true);
        assert_eq!(value["student_credential"]["salt"], "02".repeat(32));
        assert_eq!(value["issuer_signature"], "abcd");
        assert_eq!(Witness::from_json(&witness.to_json().unwrap()).unwrap(), witness);
    }

    #[test]
    fn test_from_json_rejects_short_id() {
        let json = r#"{"student_credential":{"id":"abcd","is_eligible":true,"salt":"00"},"issuer_signature":""}"#;
        assert!(matches!(
            Witness::from_json(json),
            Err(CredentialError::Serialization(_))
        ));
    }
}
