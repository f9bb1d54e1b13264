//! Integration test: archive → canonical form → verification → witness,
//! against the bundled signed fixtures.

use chrono::NaiveDate;

use paperless_core::{Bytes32, ErrorKind};
use paperless_credentials::{
    canonical, verify, verify_with_store, CredentialError, KycBundle, SignedXmlDocument,
    WitnessBuilder,
};
use paperless_crypto::{hashing, signing, KeyPair, Signature, TrustAnchor};
use paperless_integration_tests::*;

const EXPECTED_SIGNED_DATA: &str = concat!(
    "<OfflinePaperlessKyc referenceId=\"432120260101093015123\"><UidData>",
    "<Poi dob=\"15-05-2000\" e=\"\" gender=\"F\" ",
    "m=\"5f0a3c1b9de44b7f8e2a61c0d3b5a7e9f1c2d4b6a8e0f2c4d6b8a0e2c4f6a8b0\" name=\"Asha Verma\"></Poi>",
    "<Poa careof=\"D/O: Ramesh &amp; Sunita\" country=\"India\" dist=\"Pune\" house=\"12\" loc=\"\" ",
    "pc=\"411001\" po=\"\" state=\"Maharashtra\" street=\"MG Road\" subdist=\"\" vtc=\"Pune\" ></Poa>",
    "<Pht>/9j/4AAQSkZJRgABAgAAAQABAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8U</Pht>",
    "</UidData></OfflinePaperlessKyc>"
);

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

// =========================================================================
// Archive extraction
// =========================================================================

#[test]
fn test_archive_extracts_and_verifies() {
    let doc = KycBundle::new(sample_archive()).extract(SHARE_CODE).unwrap();
    assert_eq!(doc.reference_id(), Some("432120260101093015123"));
    assert_eq!(doc.poi().mobile, SAMPLE_MOBILE);

    let outcome = verify_with_store(&doc, &issuer_store());
    assert!(outcome.certificate_trusted());
    assert!(outcome.digest_matches());
    assert!(outcome.signature_valid());
    assert!(outcome.overall_valid());
    assert_eq!(outcome.anchor(), Some("test-issuer"));
}

#[test]
fn test_wrong_share_code_is_bad_password() {
    let err = KycBundle::new(sample_archive()).extract("0000").unwrap_err();
    assert!(matches!(err, CredentialError::BadPassword(_)));
    assert_eq!(err.kind(), ErrorKind::BadPassword);
}

#[test]
fn test_archive_matches_plain_fixture() {
    let extracted = KycBundle::new(sample_archive()).extract(SHARE_CODE).unwrap();
    let plain = sample_document();
    assert_eq!(
        extracted.canonical_signed_data(),
        plain.canonical_signed_data()
    );
    assert_eq!(extracted.digest_value(), plain.digest_value());
}

// =========================================================================
// Canonicalization and tamper detection
// =========================================================================

#[test]
fn test_canonical_signed_data_literal() {
    let doc = sample_document();
    assert_eq!(doc.canonical_signed_data(), EXPECTED_SIGNED_DATA);
    assert_eq!(
        hashing::sha256_base64(EXPECTED_SIGNED_DATA.as_bytes()),
        doc.digest_value()
    );
}

#[test]
fn test_canonicalization_is_idempotent_on_fixture() {
    let once = canonical::canonicalize(&fixture_text("sample_kyc.xml"));
    assert_eq!(canonical::canonicalize(&once), once);
    assert!(!once.contains('\r'));
    assert!(!once.contains("/>"));
}

#[test]
fn test_single_character_change_breaks_digest() {
    let tampered = fixture_text("sample_kyc.xml").replace("name=\"Asha Verma\"", "name=\"Asha Varma\"");
    let doc = SignedXmlDocument::parse(tampered).unwrap();

    let outcome = verify(&doc, &issuer_anchor());
    assert!(outcome.certificate_trusted());
    assert!(!outcome.digest_matches());
    // SignedInfo is untouched, so its signature still checks out.
    assert!(outcome.signature_valid());
    assert!(!outcome.overall_valid());
    assert!(matches!(outcome.into_result(), Err(CredentialError::DigestMismatch)));
}

#[test]
fn test_corrupted_digest_value() {
    let xml = fixture_text("sample_kyc.xml");
    let digest = sample_document().digest_value().to_string();
    let corrupted = format!("A{}", &digest[1..]);
    assert_ne!(corrupted, digest);
    let doc = SignedXmlDocument::parse(xml.replace(&digest, &corrupted)).unwrap();

    let outcome = verify_with_store(&doc, &issuer_store());
    assert!(outcome.certificate_trusted());
    assert!(!outcome.digest_matches());
    assert!(!outcome.signature_valid());
    assert_eq!(outcome.failed_checks(), vec!["digest_matches", "signature_valid"]);
}

#[test]
fn test_rogue_certificate_is_untrusted() {
    let doc = rogue_document();
    let outcome = verify_with_store(&doc, &issuer_store());
    assert!(!outcome.certificate_trusted());
    assert!(!outcome.overall_valid());
    assert_eq!(outcome.checks().len(), 1);

    // The embedded authority anchor does not vouch for it either.
    assert!(!verify(&doc, &TrustAnchor::issuing_authority()).certificate_trusted());
}

// =========================================================================
// Witness construction
// =========================================================================

#[test]
fn test_offline_witness_from_archive() {
    let doc = KycBundle::new(sample_archive()).extract(SHARE_CODE).unwrap();
    let outcome = verify_with_store(&doc, &issuer_store()).into_result().unwrap();

    let builder = WitnessBuilder::offline().with_reference_date(reference_date());
    let attributes = builder.attributes(&doc).unwrap();
    assert_eq!(attributes.age_years, 26);
    assert!(attributes.is_eligible);

    let witness = builder.build(&doc, &outcome).unwrap();
    assert_eq!(
        *witness.credential_id(),
        Bytes32(hashing::sha256(SAMPLE_MOBILE.as_bytes()))
    );
    assert_eq!(
        witness.credential_id().to_hex(),
        "09d4f8426a36537dc047302f8bbb36dc3b338ade4a09bbf6ad8a26714e78765e"
    );
    assert!(witness.is_eligible());
    assert_eq!(witness.issuer_signature.len(), 256);

    let parsed = paperless_credentials::Witness::from_json(&witness.to_json().unwrap()).unwrap();
    assert_eq!(parsed.credential_id(), witness.credential_id());
    assert_eq!(parsed.salt(), witness.salt());
}

#[test]
fn test_oracle_witness_is_signed_by_issuer_key() {
    let doc = sample_document();
    let outcome = verify_with_store(&doc, &issuer_store());
    let key = KeyPair::from_seed(&[9; 32]);
    let public_key = key.public_key();

    let witness = WitnessBuilder::oracle(key)
        .with_reference_date(reference_date())
        .build(&doc, &outcome)
        .unwrap();
    let signature = Signature::from_bytes(&witness.issuer_signature).unwrap();
    assert!(signing::verify(witness.credential_id().as_bytes(), &signature, &public_key).is_ok());
}

#[test]
fn test_unverified_document_yields_no_witness() {
    let doc = rogue_document();
    let outcome = verify_with_store(&doc, &issuer_store());
    let err = WitnessBuilder::offline().build(&doc, &outcome).unwrap_err();
    assert!(matches!(err, CredentialError::UnverifiedCredential(_)));
    assert_eq!(err.kind(), ErrorKind::UnverifiedCredential);
}

#[test]
fn test_valid_outcome_does_not_transfer_to_another_document() {
    let genuine = sample_document();
    let outcome = verify_with_store(&genuine, &issuer_store());
    assert!(outcome.overall_valid());
    assert!(outcome.is_for(&genuine));

    let builder = WitnessBuilder::offline().with_reference_date(reference_date());
    let err = builder.build(&rogue_document(), &outcome).unwrap_err();
    assert!(matches!(err, CredentialError::UnverifiedCredential(_)));

    let tampered = SignedXmlDocument::parse(
        fixture_text("sample_kyc.xml").replace("name=\"Asha Verma\"", "name=\"Asha Varma\""),
    )
    .unwrap();
    assert!(!outcome.is_for(&tampered));
    assert!(matches!(
        builder.build(&tampered, &outcome),
        Err(CredentialError::UnverifiedCredential(_))
    ));

    assert!(builder.build(&genuine, &outcome).is_ok());
}
