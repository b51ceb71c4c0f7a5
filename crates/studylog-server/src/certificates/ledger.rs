//! Owner listings, document downloads and revocation.

use tracing::{info, instrument};

use super::error::CertificateError;
use super::parse_identifier;
use crate::storage::{Certificate, StudyDatabase};

/// Certificate operations beyond issue and verify.
///
/// Callers decide who may invoke each operation.
#[derive(Clone)]
pub struct CertificateLedger {
    db: StudyDatabase,
}

impl CertificateLedger {
    pub const fn new(db: StudyDatabase) -> Self {
        Self { db }
    }

    /// Certificates earned by `owner_id`, newest first.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Certificate>, CertificateError> {
        Ok(self.db.list_certificates_for_owner(owner_id).await?)
    }

    /// A certificate together with its rendered PDF.
    pub async fn document(
        &self,
        raw_identifier: &str,
    ) -> Result<(Certificate, Vec<u8>), CertificateError> {
        let identifier = parse_identifier(raw_identifier).ok_or(CertificateError::NotFound)?;
        let cert = self
            .db
            .get_certificate(&identifier)
            .await?
            .ok_or(CertificateError::NotFound)?;
        let document = self
            .db
            .get_certificate_document(&identifier)
            .await?
            .ok_or(CertificateError::NotFound)?;
        Ok((cert, document))
    }

    /// Mark a certificate revoked. Revoking twice is a no-op.
    #[instrument(skip(self))]
    pub async fn revoke(&self, raw_identifier: &str) -> Result<Certificate, CertificateError> {
        let identifier = parse_identifier(raw_identifier).ok_or(CertificateError::NotFound)?;
        let cert = self
            .db
            .revoke_certificate(&identifier)
            .await?
            .ok_or(CertificateError::NotFound)?;
        info!(identifier = %cert.identifier, revoked_at = ?cert.revoked_at, "Certificate revoked");
        Ok(cert)
    }
}
