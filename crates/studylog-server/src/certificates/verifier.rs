//! Public certificate verification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use super::error::CertificateError;
use super::parse_identifier;
use crate::storage::{Certificate, StudyDatabase};

/// The only certificate data shown to unauthenticated callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicCertificate {
    pub identifier: String,
    pub student_name: String,
    pub subject: String,
    pub total_hours: f64,
    pub issued_at: DateTime<Utc>,
    pub revoked: bool,
}

impl From<Certificate> for PublicCertificate {
    fn from(cert: Certificate) -> Self {
        Self {
            revoked: cert.is_revoked(),
            issued_at: DateTime::from_timestamp(cert.issued_at, 0).unwrap_or_default(),
            identifier: cert.identifier,
            student_name: cert.student_name,
            subject: cert.subject,
            total_hours: cert.total_hours,
        }
    }
}

/// Read-only lookups by public identifier.
#[derive(Clone)]
pub struct CertificateVerifier {
    db: StudyDatabase,
}

impl CertificateVerifier {
    pub const fn new(db: StudyDatabase) -> Self {
        Self { db }
    }

    /// Look up a certificate by an untrusted identifier.
    ///
    /// Malformed and unknown identifiers are both `NotFound`. Revoked
    /// certificates are returned with `revoked = true`.
    #[instrument(skip(self))]
    pub async fn verify(&self, raw_identifier: &str) -> Result<PublicCertificate, CertificateError> {
        let Some(identifier) = parse_identifier(raw_identifier) else {
            debug!("Rejected malformed certificate identifier");
            return Err(CertificateError::NotFound);
        };

        self.db
            .get_certificate(&identifier)
            .await?
            .map(PublicCertificate::from)
            .ok_or(CertificateError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::storage::{NewCertificate, NewStudyPlan, NewUser, Role};

    const ID: &str = "0b6b7c86-3f6e-4c3b-9d0e-2f1a5c7d9e11";

    async fn db_with_certificate() -> StudyDatabase {
        let db = StudyDatabase::open_in_memory().await.unwrap();
        for (id, role) in [("s1", Role::Student), ("t1", Role::Teacher)] {
            db.create_user(&NewUser {
                id,
                name: "Ana Souza",
                email: &format!("{id}@example.com"),
                role,
                study_objective: None,
                is_approved: true,
            })
            .await
            .unwrap();
        }
        db.create_plan(&NewStudyPlan {
            id: "p1",
            student_id: "s1",
            mentor_id: "t1",
            target_subject: "Civil Law",
            target_hours: 10.0,
            deadline: None,
        })
        .await
        .unwrap();
        db.insert_certificate(&NewCertificate {
            identifier: ID,
            owner_id: "s1",
            plan_id: "p1",
            student_name: "Ana Souza",
            subject: "Civil Law",
            total_hours: 10.0,
            issued_at: 1_700_000_000,
            document: b"%PDF-",
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn issued_certificate_verifies() {
        let verifier = CertificateVerifier::new(db_with_certificate().await);
        let public = verifier.verify(ID).await.unwrap();

        assert_eq!(public.identifier, ID);
        assert_eq!(public.student_name, "Ana Souza");
        assert_eq!(public.subject, "Civil Law");
        assert_eq!(public.total_hours, 10.0);
        assert_eq!(public.issued_at.timestamp(), 1_700_000_000);
        assert!(!public.revoked);
    }

    #[tokio::test]
    async fn uppercase_identifier_verifies() {
        let verifier = CertificateVerifier::new(db_with_certificate().await);
        let public = verifier.verify(&ID.to_uppercase()).await.unwrap();
        assert_eq!(public.identifier, ID);
    }

    #[tokio::test]
    async fn revoked_certificate_still_verifies_as_revoked() {
        let db = db_with_certificate().await;
        db.revoke_certificate(ID).await.unwrap();

        let public = CertificateVerifier::new(db).verify(ID).await.unwrap();
        assert!(public.revoked);
    }

    #[tokio::test]
    async fn unknown_and_malformed_identifiers_are_not_found() {
        let verifier = CertificateVerifier::new(db_with_certificate().await);
        for raw in [
            "abc-123",
            "",
            "00000000-0000-4000-8000-000000000000",
            &uuid::Uuid::new_v4().to_string(),
            "<script>alert(1)</script>",
        ] {
            assert!(
                matches!(verifier.verify(raw).await, Err(CertificateError::NotFound)),
                "{raw:?} should be not found"
            );
        }
    }

    #[tokio::test]
    async fn public_view_omits_internal_references() {
        let verifier = CertificateVerifier::new(db_with_certificate().await);
        let json = serde_json::to_value(verifier.verify(ID).await.unwrap()).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();

        assert!(!keys.iter().any(|k| k == "owner_id" || k == "plan_id" || k == "email"));
        assert_eq!(json["issued_at"], "2023-11-14T22:13:20Z");
    }
}
