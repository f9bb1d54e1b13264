//! Canonicalization of the signed portions of an offline KYC document.
//!
//! The issuer hashes a normalized rendering of the document, not the bytes
//! on disk. Each normalization step is a separate pure function; they are
//! applied in a fixed order by [`canonicalize`]:
//!
//! 1. line endings become `\n` ([`normalize_newlines`])
//! 2. `&#13;` character references become `\n` ([`replace_cr_references`])
//! 3. whitespace between `>` and `<` is removed ([`collapse_inter_tag_whitespace`])
//! 4. `<name attrs/>` becomes `<name attrs></name>` ([`expand_self_closing_tags`])
//! 5. leading and trailing whitespace is trimmed

/// Root element of the offline KYC document.
pub const ROOT_ELEMENT: &str = "OfflinePaperlessKyc";

/// Element wrapping the signed identity data.
pub const UID_DATA_ELEMENT: &str = "UidData";

/// Namespace `SignedInfo` inherits from its enclosing `Signature`.
pub const XMLDSIG_NAMESPACE: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_newlines(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace literal `&#13;` references with `\n`.
pub fn replace_cr_references(input: &str) -> String {
    input.replace("&#13;", "\n")
}

/// Drop every whitespace run that sits directly between `>` and `<`.
///
/// Whitespace inside text content (not bounded by tags on both sides) is
/// kept.
pub fn collapse_inter_tag_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        out.push(c);
        if c != '>' {
            continue;
        }
        let run_start = match chars.peek() {
            Some(&(i, next)) if next.is_whitespace() => i,
            _ => continue,
        };
        let mut run_end = input.len();
        while let Some(&(i, next)) = chars.peek() {
            if !next.is_whitespace() {
                run_end = i;
                break;
            }
            chars.next();
        }
        if !input[run_end..].starts_with('<') {
            out.push_str(&input[run_start..run_end]);
        }
    }
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
}

/// Expand `<name attrs/>` to `<name attrs></name>`.
///
/// The attribute text is carried over unchanged, including any whitespace
/// before the `/`.
pub fn expand_self_closing_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('<') {
        let lt = pos + offset;
        out.push_str(&input[pos..lt]);

        let after = &input[lt + 1..];
        let name_len = after
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map(|(i, _)| i)
            .unwrap_or(after.len());

        let expanded = if name_len == 0 {
            None
        } else {
            after.find('>').and_then(|gt| {
                let head = &after[..gt];
                head.strip_suffix('/').map(|body| (body, gt))
            })
        };

        match expanded {
            Some((body, gt)) => {
                let name = &after[..name_len];
                out.push('<');
                out.push_str(body);
                out.push_str("></");
                out.push_str(name);
                out.push('>');
                pos = lt + 1 + gt + 1;
            }
            None => {
                out.push('<');
                pos = lt + 1;
            }
        }
    }
    out.push_str(&input[pos..]);
    out
}

/// Apply every normalization step in order.
pub fn canonicalize(input: &str) -> String {
    let text = normalize_newlines(input);
    let text = replace_cr_references(&text);
    let text = collapse_inter_tag_whitespace(&text);
    let text = expand_self_closing_tags(&text);
    text.trim().to_string()
}

/// Rebuild the content covered by `DigestValue`: the root start tag with
/// its original attribute text, wrapping the inner content of `UidData`.
pub fn signed_data(root_attributes: &str, uid_data_inner: &str) -> String {
    let rebuilt = format!(
        "<{ROOT_ELEMENT}{root_attributes}><{UID_DATA_ELEMENT}>{uid_data_inner}</{UID_DATA_ELEMENT}></{ROOT_ELEMENT}>"
    );
    let canonical = canonicalize(&rebuilt);
    tracing::debug!(bytes = canonical.len(), "signed data canonicalized");
    canonical
}

/// Rebuild `SignedInfo` with the namespace it inherits from `Signature`.
pub fn signed_info(signed_info_inner: &str) -> String {
    let canonical = format!(
        "<SignedInfo xmlns=\"{XMLDSIG_NAMESPACE}\">{}</SignedInfo>",
        canonicalize(signed_info_inner)
    );
    tracing::debug!(bytes = canonical.len(), "SignedInfo canonicalized");
    canonical
}
