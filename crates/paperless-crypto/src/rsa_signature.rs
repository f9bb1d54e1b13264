use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use x509_cert::der::{Decode, Encode};
use x509_cert::Certificate;

use crate::error::CryptoError;
use crate::hashing;

/// RSA public key taken from an X.509 certificate's subject public key info.
#[derive(Debug, Clone)]
pub struct CertificateKey {
    inner: RsaPublicKey,
}

impl CertificateKey {
    /// Extract the RSA key from a DER-encoded certificate.
    pub fn from_certificate_der(der: &[u8]) -> Result<Self, CryptoError> {
        let cert = Certificate::from_der(der)
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let spki = cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| CryptoError::InvalidCertificate(e.to_string()))?;
        let inner = RsaPublicKey::from_public_key_der(&spki)
            .map_err(|e| CryptoError::UnsupportedKey(e.to_string()))?;
        Ok(Self { inner })
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

/// Verify a PKCS#1 v1.5 RSA-SHA1 signature over `message`.
pub fn verify_rsa_sha1(
    key: &CertificateKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let digest = hashing::sha1(message);
    key.inner
        .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
