use roxmltree::Node;

use paperless_core::Bytes32;
use paperless_crypto::{hashing, normalize_base64};

use crate::canonical::{self, ROOT_ELEMENT, UID_DATA_ELEMENT};
use crate::error::CredentialError;

/// Proof-of-identity attributes carried on `UidData/Poi`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoiAttributes {
    pub name: Option<String>,
    /// Date of birth exactly as declared (`DD-MM-YYYY` or `YYYY-MM-DD`).
    pub dob: String,
    pub gender: Option<String>,
    /// Raw mobile field (`m`), hashed before it leaves this crate.
    pub mobile: String,
}

/// A parsed offline KYC document.
///
/// Keeps the raw text alongside the slices the verifier needs. Every
/// signature-block field is required; a document missing any of them is
/// rejected at parse time.
#[derive(Debug, Clone)]
pub struct SignedXmlDocument {
    raw: String,
    reference_id: Option<String>,
    root_attributes: String,
    uid_data_inner: String,
    signed_info_inner: String,
    digest_value: String,
    x509_certificate: String,
    signature_value: String,
    poi: PoiAttributes,
}

struct Fields {
    reference_id: Option<String>,
    root_attributes: String,
    uid_data_inner: String,
    signed_info_inner: String,
    digest_value: String,
    x509_certificate: String,
    signature_value: String,
    poi: PoiAttributes,
}

impl SignedXmlDocument {
    /// Parse document text.
    pub fn parse(xml: impl Into<String>) -> Result<Self, CredentialError> {
        let raw = xml.into();
        let fields = extract_fields(&raw)?;
        tracing::debug!(
            reference_id = fields.reference_id.as_deref().unwrap_or("-"),
            "offline KYC document parsed"
        );
        Ok(Self {
            raw,
            reference_id: fields.reference_id,
            root_attributes: fields.root_attributes,
            uid_data_inner: fields.uid_data_inner,
            signed_info_inner: fields.signed_info_inner,
            digest_value: fields.digest_value,
            x509_certificate: fields.x509_certificate,
            signature_value: fields.signature_value,
            poi: fields.poi,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// SHA-256 of the raw document text.
    pub fn fingerprint(&self) -> Bytes32 {
        Bytes32(hashing::sha256(self.raw.as_bytes()))
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    /// Root start-tag attribute text, verbatim (leading whitespace included).
    pub fn root_attributes(&self) -> &str {
        &self.root_attributes
    }

    /// Inner text of `UidData`, verbatim.
    pub fn uid_data_inner(&self) -> &str {
        &self.uid_data_inner
    }

    /// Inner text of `SignedInfo`, verbatim.
    pub fn signed_info_inner(&self) -> &str {
        &self.signed_info_inner
    }

    /// Declared digest (base64, whitespace removed).
    pub fn digest_value(&self) -> &str {
        &self.digest_value
    }

    /// Embedded signing certificate (base64, whitespace removed).
    pub fn x509_certificate(&self) -> &str {
        &self.x509_certificate
    }

    /// Signature over `SignedInfo` (base64, whitespace removed).
    pub fn signature_value(&self) -> &str {
        &self.signature_value
    }

    pub fn poi(&self) -> &PoiAttributes {
        &self.poi
    }

    /// Canonical bytes covered by `DigestValue`.
    pub fn canonical_signed_data(&self) -> String {
        canonical::signed_data(&self.root_attributes, &self.uid_data_inner)
    }

    /// Canonical `SignedInfo` covered by `SignatureValue`.
    pub fn canonical_signed_info(&self) -> String {
        canonical::signed_info(&self.signed_info_inner)
    }
}

fn malformed(msg: impl Into<String>) -> CredentialError {
    CredentialError::MalformedDocument(msg.into())
}

fn extract_fields(raw: &str) -> Result<Fields, CredentialError> {
    let doc = roxmltree::Document::parse(raw).map_err(|e| malformed(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(malformed(format!(
            "root element is <{}>, expected <{ROOT_ELEMENT}>",
            root.tag_name().name()
        )));
    }

    let uid_data = required(child(root, UID_DATA_ELEMENT), "OfflinePaperlessKyc/UidData")?;
    let poi = required(child(uid_data, "Poi"), "UidData/Poi")?;
    let signature = required(child(root, "Signature"), "OfflinePaperlessKyc/Signature")?;
    let signed_info = required(child(signature, "SignedInfo"), "Signature/SignedInfo")?;
    let digest_value = required(descendant(signed_info, "DigestValue"), "SignedInfo//DigestValue")?;
    let signature_value = required(child(signature, "SignatureValue"), "Signature/SignatureValue")?;
    let certificate = required(
        descendant(signature, "X509Certificate"),
        "Signature//X509Certificate",
    )?;

    Ok(Fields {
        reference_id: root.attribute("referenceId").map(str::to_owned),
        root_attributes: start_tag_attributes(raw, root)?.to_owned(),
        uid_data_inner: inner_text(raw, uid_data)?.to_owned(),
        signed_info_inner: inner_text(raw, signed_info)?.to_owned(),
        digest_value: base64_field(digest_value, "DigestValue")?,
        x509_certificate: base64_field(certificate, "X509Certificate")?,
        signature_value: base64_field(signature_value, "SignatureValue")?,
        poi: PoiAttributes {
            name: poi.attribute("name").map(str::to_owned),
            dob: required_attribute(poi, "dob")?,
            gender: poi.attribute("gender").map(str::to_owned),
            mobile: required_attribute(poi, "m")?,
        },
    })
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn descendant<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

fn required<'a, 'i>(node: Option<Node<'a, 'i>>, path: &str) -> Result<Node<'a, 'i>, CredentialError> {
    node.ok_or_else(|| malformed(format!("missing element {path}")))
}

fn required_attribute(node: Node, name: &str) -> Result<String, CredentialError> {
    node.attribute(name).map(str::to_owned).ok_or_else(|| {
        malformed(format!(
            "missing attribute {name} on <{}>",
            node.tag_name().name()
        ))
    })
}

fn base64_field(node: Node, name: &str) -> Result<String, CredentialError> {
    let text: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let value = normalize_base64(&text);
    if value.is_empty() {
        return Err(malformed(format!("empty {name}")));
    }
    Ok(value)
}

/// Byte offset of the `>` closing the element's start tag. Quoted
/// attribute values may contain `>`.
fn start_tag_end(raw: &str, node: Node) -> Result<usize, CredentialError> {
    let range = node.range();
    let bytes = raw.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().take(range.end).skip(range.start) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Ok(i),
            None => {}
        }
    }
    Err(malformed(format!(
        "unterminated start tag <{}>",
        node.tag_name().name()
    )))
}

fn start_tag_attributes<'i>(raw: &'i str, node: Node) -> Result<&'i str, CredentialError> {
    let start = node.range().start + 1;
    let tag = &raw[start..start_tag_end(raw, node)?];
    let name_len = tag
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(tag.len());
    Ok(&tag[name_len..])
}

fn inner_text<'i>(raw: &'i str, node: Node) -> Result<&'i str, CredentialError> {
    let gt = start_tag_end(raw, node)?;
    if raw.as_bytes()[gt - 1] == b'/' {
        return Ok("");
    }
    let range = node.range();
    let close = raw[range.clone()]
        .rfind("</")
        .map(|i| range.start + i)
        .filter(|&close| close > gt)
        .ok_or_else(|| malformed(format!("unterminated <{}>", node.tag_name().name())))?;
    Ok(&raw[gt + 1..close])
}
