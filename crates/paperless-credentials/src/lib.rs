//! Paperless Credentials: offline KYC archive extraction, signed-XML
//! canonicalization and verification, eligibility and witness construction.

pub mod archive;
pub mod canonical;
pub mod document;
pub mod eligibility;
pub mod error;
pub mod verifier;
pub mod witness;

pub use archive::{extract, KycBundle};
pub use document::{PoiAttributes, SignedXmlDocument};
pub use eligibility::{age_years, parse_date_of_birth, IdentityAttributes, MIN_ELIGIBLE_AGE};
pub use error::CredentialError;
pub use verifier::{verify, verify_with_store, VerificationCheck, VerificationOutcome};
pub use witness::{IssuerSignatureSource, StudentCredential, Witness, WitnessBuilder};
