use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::document::SignedXmlDocument;
use crate::error::CredentialError;

/// A password-protected offline KYC archive.
///
/// Holds the raw archive buffer; [`KycBundle::extract`] yields exactly one
/// document or fails as a whole.
#[derive(Clone)]
pub struct KycBundle {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for KycBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KycBundle").field("len", &self.bytes.len()).finish()
    }
}

impl KycBundle {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decrypt the `.xml` entry and parse it.
    pub fn extract(&self, password: &str) -> Result<SignedXmlDocument, CredentialError> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))
            .map_err(|e| CredentialError::MalformedDocument(format!("not a readable archive: {e}")))?;

        let entry_name = archive
            .file_names()
            .find(|name| name.to_ascii_lowercase().ends_with(".xml"))
            .map(str::to_owned)
            .ok_or(CredentialError::MissingPayload)?;

        let mut contents = Vec::new();
        {
            let mut entry = archive
                .by_name_decrypt(&entry_name, password.as_bytes())
                .map_err(|e| match e {
                    ZipError::InvalidPassword => {
                        CredentialError::BadPassword("password rejected".into())
                    }
                    other => CredentialError::BadPassword(format!("cannot decrypt entry: {other}")),
                })?;
            entry.read_to_end(&mut contents).map_err(|e| {
                CredentialError::BadPassword(format!("decrypted entry is unreadable: {e}"))
            })?;
        }

        if contents.is_empty() {
            return Err(CredentialError::BadPassword(
                "decryption yielded no bytes".into(),
            ));
        }

        let xml = String::from_utf8(contents)
            .map_err(|_| CredentialError::MalformedDocument("document is not UTF-8".into()))?;
        tracing::debug!(entry = %entry_name, bytes = xml.len(), "archive entry decrypted");
        SignedXmlDocument::parse(xml)
    }
}

/// Decrypt and parse the document inside an archive buffer.
pub fn extract(archive_bytes: &[u8], password: &str) -> Result<SignedXmlDocument, CredentialError> {
    KycBundle::new(archive_bytes).extract(password)
}
