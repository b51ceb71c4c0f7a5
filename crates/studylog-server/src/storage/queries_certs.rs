//! Certificate store queries.
//!
//! Certificates are append-only. The schema rejects deletes and edits to
//! anything but the revocation columns, and `plan_id` is unique so a plan
//! can never hold two certificates.

use studylog_core::db::unix_timestamp;

use super::db::{DatabaseError, StudyDatabase};
use super::models::Certificate;

macro_rules! select_certificate {
    ($tail:literal) => {
        concat!(
            "SELECT identifier, owner_id, plan_id, student_name, subject, total_hours, issued_at, revoked, revoked_at FROM certificates ",
            $tail
        )
    };
}

/// Parameters for storing a freshly issued certificate.
pub struct NewCertificate<'a> {
    pub identifier: &'a str,
    pub owner_id: &'a str,
    pub plan_id: &'a str,
    pub student_name: &'a str,
    pub subject: &'a str,
    pub total_hours: f64,
    pub issued_at: i64,
    pub document: &'a [u8],
}

/// Result of an insert attempt against the per-plan uniqueness constraint.
#[derive(Debug, Clone)]
pub enum CertificateInsert {
    /// The row was written.
    Inserted(Certificate),
    /// The plan already had a certificate; this is the stored one.
    Existing(Certificate),
}

impl StudyDatabase {
    /// Insert a certificate unless its plan already has one.
    ///
    /// A concurrent issuer that loses the race gets the winner's row back.
    pub async fn insert_certificate(
        &self,
        params: &NewCertificate<'_>,
    ) -> Result<CertificateInsert, DatabaseError> {
        let result = sqlx::query(
            "INSERT INTO certificates (identifier, owner_id, plan_id, student_name, subject, total_hours, issued_at, document) VALUES (?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(plan_id) DO NOTHING",
        )
        .bind(params.identifier)
        .bind(params.owner_id)
        .bind(params.plan_id)
        .bind(params.student_name)
        .bind(params.subject)
        .bind(params.total_hours)
        .bind(params.issued_at)
        .bind(params.document)
        .execute(self.pool())
        .await?;

        let stored = self
            .get_certificate_for_plan(params.plan_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Certificate for plan {}", params.plan_id)))?;

        if result.rows_affected() > 0 {
            Ok(CertificateInsert::Inserted(stored))
        } else {
            Ok(CertificateInsert::Existing(stored))
        }
    }

    /// Look up a certificate by its public identifier.
    pub async fn get_certificate(
        &self,
        identifier: &str,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let cert = sqlx::query_as::<_, Certificate>(select_certificate!("WHERE identifier = ?"))
            .bind(identifier)
            .fetch_optional(self.pool())
            .await?;

        Ok(cert)
    }

    /// Look up the certificate issued for a plan, if any.
    pub async fn get_certificate_for_plan(
        &self,
        plan_id: &str,
    ) -> Result<Option<Certificate>, DatabaseError> {
        let cert = sqlx::query_as::<_, Certificate>(select_certificate!("WHERE plan_id = ?"))
            .bind(plan_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(cert)
    }

    /// List a student's certificates, newest first.
    pub async fn list_certificates_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<Certificate>, DatabaseError> {
        let certs = sqlx::query_as::<_, Certificate>(select_certificate!(
            "WHERE owner_id = ? ORDER BY issued_at DESC, identifier"
        ))
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        Ok(certs)
    }

    /// Fetch the rendered PDF for a certificate.
    pub async fn get_certificate_document(
        &self,
        identifier: &str,
    ) -> Result<Option<Vec<u8>>, DatabaseError> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT document FROM certificates WHERE identifier = ?")
                .bind(identifier)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.map(|(document,)| document))
    }

    /// Revoke a certificate. Already-revoked certificates keep their original
    /// `revoked_at`. Returns `None` for unknown identifiers.
    pub async fn revoke_certificate(
        &self,
        identifier: &str,
    ) -> Result<Option<Certificate>, DatabaseError> {
        sqlx::query(
            "UPDATE certificates SET revoked = 1, revoked_at = ? WHERE identifier = ? AND revoked = 0",
        )
        .bind(unix_timestamp())
        .bind(identifier)
        .execute(self.pool())
        .await?;

        self.get_certificate(identifier).await
    }
}
