use chrono::{Datelike, NaiveDate, Utc};

use paperless_core::Bytes32;
use paperless_crypto::hashing;

use crate::document::SignedXmlDocument;
use crate::error::CredentialError;

/// Minimum age, in whole years, for eligibility.
pub const MIN_ELIGIBLE_AGE: u32 = 18;

/// Attributes derived from a verified document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAttributes {
    /// SHA-256 of the raw mobile field. Doubles as the credential id.
    pub mobile_number_hash: Bytes32,
    pub age_years: u32,
    pub is_eligible: bool,
}

impl IdentityAttributes {
    /// Derive attributes as of `reference_date`.
    pub fn derive(
        doc: &SignedXmlDocument,
        reference_date: NaiveDate,
    ) -> Result<Self, CredentialError> {
        let dob = parse_date_of_birth(&doc.poi().dob)?;
        let age_years = age_years(dob, reference_date)?;
        Ok(Self {
            mobile_number_hash: Bytes32(hashing::sha256(doc.poi().mobile.as_bytes())),
            age_years,
            is_eligible: age_years >= MIN_ELIGIBLE_AGE,
        })
    }

    /// Derive attributes as of today (UTC).
    pub fn derive_now(doc: &SignedXmlDocument) -> Result<Self, CredentialError> {
        Self::derive(doc, Utc::now().date_naive())
    }
}

/// Parse `DD-MM-YYYY` or `YYYY-MM-DD`. Anything else, including impossible
/// calendar dates, is rejected.
pub fn parse_date_of_birth(input: &str) -> Result<NaiveDate, CredentialError> {
    let value = input.trim();
    let bytes = value.as_bytes();
    let dash_at = |positions: [usize; 2]| {
        bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| {
                if positions.contains(&i) {
                    *b == b'-'
                } else {
                    b.is_ascii_digit()
                }
            })
    };

    let format = if dash_at([2, 5]) {
        "%d-%m-%Y"
    } else if dash_at([4, 7]) {
        "%Y-%m-%d"
    } else {
        return Err(CredentialError::UnparseableDate(format!(
            "'{value}' is neither DD-MM-YYYY nor YYYY-MM-DD"
        )));
    };

    NaiveDate::parse_from_str(value, format)
        .map_err(|e| CredentialError::UnparseableDate(format!("'{value}': {e}")))
}

/// Whole calendar years between `dob` and `reference_date`; the year only
/// counts once the birthday has been reached.
pub fn age_years(dob: NaiveDate, reference_date: NaiveDate) -> Result<u32, CredentialError> {
    if dob > reference_date {
        return Err(CredentialError::UnparseableDate(format!(
            "date of birth {dob} is after {reference_date}"
        )));
    }
    let mut years = reference_date.year() - dob.year();
    if (reference_date.month(), reference_date.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    u32::try_from(years)
        .map_err(|_| CredentialError::UnparseableDate(format!("negative age for {dob}")))
}
