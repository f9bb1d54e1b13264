use std::path::Path;

use base64::Engine;

use crate::error::CryptoError;
use crate::rsa_signature::CertificateKey;

const ISSUING_AUTHORITY_CERT: &str = include_str!("../certs/issuing_authority.cer");

/// Strip PEM armour lines and every whitespace character from base64 text.
///
/// Certificates embedded in documents arrive wrapped at 76 columns with
/// carriage returns; anchors may be PEM files. Both compare equal once
/// normalized.
pub fn normalize_base64(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// A pinned signing certificate.
///
/// A document is trusted only when its embedded certificate equals a
/// pinned anchor byte for byte after base64 normalization.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    name: String,
    normalized: String,
    der: Vec<u8>,
}

impl TrustAnchor {
    /// Build from base64 or PEM text.
    pub fn from_text(name: impl Into<String>, text: &str) -> Result<Self, CryptoError> {
        let normalized = normalize_base64(text);
        if normalized.is_empty() {
            return Err(CryptoError::InvalidCertificate("empty certificate".into()));
        }
        let der = base64::engine::general_purpose::STANDARD
            .decode(&normalized)
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        Ok(Self {
            name: name.into(),
            normalized,
            der,
        })
    }

    /// Load an anchor from a `.pem`/`.cer` text file. The file stem becomes
    /// the anchor name.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let anchor = Self::from_text(name, &text)?;
        tracing::debug!(anchor = %anchor.name, path = %path.display(), "trust anchor loaded");
        Ok(anchor)
    }

    /// The production issuing authority's signing certificate.
    pub fn issuing_authority() -> Self {
        let normalized = normalize_base64(ISSUING_AUTHORITY_CERT);
        let der = base64::engine::general_purpose::STANDARD
            .decode(&normalized)
            .unwrap_or_default();
        Self {
            name: "issuing-authority".into(),
            normalized,
            der,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Whether an embedded certificate (any base64 wrapping) is this anchor.
    pub fn matches(&self, embedded: &str) -> bool {
        normalize_base64(embedded) == self.normalized
    }

    /// The RSA verification key carried in the pinned certificate.
    pub fn public_key(&self) -> Result<CertificateKey, CryptoError> {
        CertificateKey::from_certificate_der(&self.der)
    }
}

/// Set of pinned anchors; a document is trusted if any anchor matches.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorStore {
    anchors: Vec<TrustAnchor>,
}

impl TrustAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding a single anchor.
    pub fn single(anchor: TrustAnchor) -> Self {
        Self {
            anchors: vec![anchor],
        }
    }

    /// Load every path; fails on the first unreadable anchor.
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CryptoError> {
        let mut store = Self::new();
        for path in paths {
            store.add(TrustAnchor::load(path.as_ref())?);
        }
        Ok(store)
    }

    pub fn add(&mut self, anchor: TrustAnchor) {
        self.anchors.push(anchor);
    }

    /// Find the anchor equal to an embedded certificate.
    pub fn find(&self, embedded: &str) -> Option<&TrustAnchor> {
        let normalized = normalize_base64(embedded);
        self.anchors.iter().find(|a| a.normalized == normalized)
    }

    pub fn anchors(&self) -> &[TrustAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
