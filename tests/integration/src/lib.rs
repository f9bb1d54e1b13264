//! Fixtures shared by the cross-crate tests.
//!
//! `sample_kyc.zip` holds `sample_kyc.xml` under share code [`SHARE_CODE`],
//! signed by the key behind `issuer_cert.pem`. `rogue_kyc.xml` carries the
//! same identity data signed by an unrelated certificate.

use std::path::PathBuf;

use paperless_credentials::SignedXmlDocument;
use paperless_crypto::{TrustAnchor, TrustAnchorStore};

pub const SHARE_CODE: &str = "4321";

/// Raw `m` attribute of the sample document.
pub const SAMPLE_MOBILE: &str = "5f0a3c1b9de44b7f8e2a61c0d3b5a7e9f1c2d4b6a8e0f2c4d6b8a0e2c4f6a8b0";

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("fixtures")
        .join(name)
}

pub fn fixture_bytes(name: &str) -> Vec<u8> {
    let path = fixture_path(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("fixture {} unreadable: {e}", path.display()))
}

pub fn fixture_text(name: &str) -> String {
    String::from_utf8(fixture_bytes(name)).expect("fixture is UTF-8")
}

pub fn sample_archive() -> Vec<u8> {
    fixture_bytes("sample_kyc.zip")
}

pub fn sample_document() -> SignedXmlDocument {
    SignedXmlDocument::parse(fixture_text("sample_kyc.xml")).expect("sample document parses")
}

pub fn rogue_document() -> SignedXmlDocument {
    SignedXmlDocument::parse(fixture_text("rogue_kyc.xml")).expect("rogue document parses")
}

pub fn issuer_anchor() -> TrustAnchor {
    TrustAnchor::from_text("test-issuer", &fixture_text("issuer_cert.pem")).expect("issuer anchor")
}

pub fn issuer_store() -> TrustAnchorStore {
    TrustAnchorStore::single(issuer_anchor())
}
