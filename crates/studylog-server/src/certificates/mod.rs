//! Certificate issuance and public verification.
//!
//! - [`CertificateIssuer`] turns a completed study plan into a stored,
//!   rendered certificate, at most once per plan.
//! - [`CertificateVerifier`] answers public lookups by identifier.
//! - [`CertificateLedger`] covers owner listings, downloads and revocation.

mod error;
mod issuer;
mod ledger;
pub mod render;
mod verifier;

pub use error::CertificateError;
pub use issuer::{CertificateIssuer, Issuance, IssuerSettings};
pub use ledger::CertificateLedger;
pub use render::{CertificateDocument, DocumentRenderer, PdfRenderer};
pub use verifier::{CertificateVerifier, PublicCertificate};

use uuid::Uuid;

/// Normalise an untrusted identifier to lowercase hyphenated UUID form.
///
/// Anything that is not a UUID cannot name a certificate.
pub fn parse_identifier(raw: &str) -> Option<String> {
    Uuid::parse_str(raw.trim())
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Public verification URL printed on a certificate.
pub fn verify_url(public_base_url: &str, identifier: &str) -> String {
    format!(
        "{}/verify/{identifier}",
        public_base_url.trim_end_matches('/')
    )
}

/// Whole minutes a student must log to reach `hours`.
///
/// The small tolerance keeps targets like 1.1 h from demanding 67 minutes
/// after float rounding.
#[allow(clippy::cast_possible_truncation)]
pub fn required_minutes(hours: f64) -> i64 {
    (hours * 60.0 - 1e-6).ceil().max(0.0) as i64
}

/// Logged minutes as hours, truncated to one decimal place.
#[allow(clippy::cast_precision_loss)]
pub fn minutes_to_hours(minutes: i64) -> f64 {
    (minutes.max(0) / 6) as f64 / 10.0
}

/// Hours as printed: `10` rather than `10.0`, otherwise one decimal.
pub fn format_hours(hours: f64) -> String {
    if hours.fract().abs() < f64::EPSILON {
        format!("{hours:.0}")
    } else {
        format!("{hours:.1}")
    }
}
