//! Certificate issuance.

use std::sync::Arc;

use studylog_core::Config;
use studylog_core::db::{DatabaseError, unix_timestamp};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::CertificateError;
use super::render::{CertificateDocument, DocumentRenderer};
use super::{minutes_to_hours, required_minutes, verify_url};
use crate::storage::{Certificate, CertificateInsert, NewCertificate, StudyDatabase};

/// Issuance policy.
#[derive(Debug, Clone)]
pub struct IssuerSettings {
    /// Floor on logged hours applied on top of each plan's target.
    pub minimum_hours: f64,
    /// Base of the verification URL printed on documents.
    pub public_base_url: String,
}

impl IssuerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            minimum_hours: config.certificates.minimum_hours,
            public_base_url: config.server.public_base_url.clone(),
        }
    }
}

/// What an issuance request produced.
#[derive(Debug, Clone)]
pub enum Issuance {
    /// A new certificate was created by this call.
    Issued(Certificate),
    /// The plan already had a certificate; it is returned unchanged.
    Existing(Certificate),
}

impl Issuance {
    pub const fn certificate(&self) -> &Certificate {
        match self {
            Self::Issued(cert) | Self::Existing(cert) => cert,
        }
    }

    pub fn into_certificate(self) -> Certificate {
        match self {
            Self::Issued(cert) | Self::Existing(cert) => cert,
        }
    }

    pub const fn is_new(&self) -> bool {
        matches!(self, Self::Issued(_))
    }
}

/// Issues at most one certificate per study plan.
#[derive(Clone)]
pub struct CertificateIssuer {
    db: StudyDatabase,
    renderer: Arc<dyn DocumentRenderer>,
    settings: IssuerSettings,
}

impl CertificateIssuer {
    pub fn new(
        db: StudyDatabase,
        renderer: Arc<dyn DocumentRenderer>,
        settings: IssuerSettings,
    ) -> Self {
        Self {
            db,
            renderer,
            settings,
        }
    }

    /// Issue the certificate for `plan_id`, owned by `student_id`.
    ///
    /// Re-issuing a plan returns the stored certificate. An ineligible plan
    /// creates nothing.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        plan_id: &str,
        student_id: &str,
    ) -> Result<Issuance, CertificateError> {
        let plan = match self.db.get_plan(plan_id).await {
            Ok(plan) if plan.student_id == student_id => plan,
            Ok(_) | Err(DatabaseError::NotFound(_)) => {
                return Err(CertificateError::GoalNotFound(plan_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(existing) = self.db.get_certificate_for_plan(&plan.id).await? {
            info!(identifier = %existing.identifier, "Certificate already issued for plan");
            return Ok(Issuance::Existing(existing));
        }

        let logged_minutes = self
            .db
            .logged_minutes(&plan.student_id, &plan.target_subject)
            .await?;
        let required_hours = plan.target_hours.max(self.settings.minimum_hours);
        if logged_minutes < required_minutes(required_hours) {
            let logged_hours = minutes_to_hours(logged_minutes);
            warn!(logged_hours, required_hours, "Certificate requested for incomplete goal");
            return Err(CertificateError::IneligibleGoal {
                logged_hours,
                required_hours,
            });
        }

        let student = self.db.get_user(&plan.student_id).await?;

        let identifier = Uuid::new_v4().hyphenated().to_string();
        let issued_at = unix_timestamp();
        let total_hours = minutes_to_hours(logged_minutes);
        let url = verify_url(&self.settings.public_base_url, &identifier);

        let document = self.renderer.render(&CertificateDocument {
            identifier: &identifier,
            student_name: &student.name,
            subject: &plan.target_subject,
            total_hours,
            issued_at,
            verify_url: &url,
        })?;

        let outcome = self
            .db
            .insert_certificate(&NewCertificate {
                identifier: &identifier,
                owner_id: &student.id,
                plan_id: &plan.id,
                student_name: &student.name,
                subject: &plan.target_subject,
                total_hours,
                issued_at,
                document: &document,
            })
            .await?;

        match outcome {
            CertificateInsert::Inserted(cert) => {
                info!(identifier = %cert.identifier, total_hours, "Certificate issued");
                Ok(Issuance::Issued(cert))
            }
            CertificateInsert::Existing(cert) => {
                info!(
                    identifier = %cert.identifier,
                    "Concurrent issuance resolved to the stored certificate"
                );
                Ok(Issuance::Existing(cert))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::certificates::render::{PdfRenderer, RenderError};
    use crate::storage::{NewStudyPlan, NewStudySession, NewUser, Role};

    struct FailingRenderer;

    impl DocumentRenderer for FailingRenderer {
        fn render(&self, doc: &CertificateDocument<'_>) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Timestamp(doc.issued_at))
        }
    }

    async fn seeded_db() -> StudyDatabase {
        let db = StudyDatabase::open_in_memory().await.unwrap();
        for (id, name, role) in [
            ("s1", "Ana Souza", Role::Student),
            ("s2", "Caio Reis", Role::Student),
            ("t1", "Bruno Lima", Role::Teacher),
        ] {
            db.create_user(&NewUser {
                id,
                name,
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
        db
    }

    async fn log_minutes(db: &StudyDatabase, id: &str, minutes: i64) {
        db.record_session(&NewStudySession {
            id,
            student_id: "s1",
            subject: "Civil Law",
            started_at: 1_700_000_000,
            duration_minutes: minutes,
            is_validated: true,
        })
        .await
        .unwrap();
    }

    fn issuer(db: &StudyDatabase) -> CertificateIssuer {
        CertificateIssuer::new(
            db.clone(),
            Arc::new(PdfRenderer::new("TARGET SaaS")),
            IssuerSettings {
                minimum_hours: 1.0,
                public_base_url: "https://target.saas".into(),
            },
        )
    }

    #[tokio::test]
    async fn completed_goal_gets_a_certificate() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 600).await;

        let issuance = issuer(&db).issue("p1", "s1").await.unwrap();
        assert!(issuance.is_new());

        let cert = issuance.certificate();
        assert_eq!(cert.owner_id, "s1");
        assert_eq!(cert.plan_id, "p1");
        assert_eq!(cert.student_name, "Ana Souza");
        assert_eq!(cert.subject, "Civil Law");
        assert_eq!(cert.total_hours, 10.0);
        assert!(!cert.is_revoked());
        assert_eq!(Uuid::parse_str(&cert.identifier).unwrap().get_version_num(), 4);

        let pdf = db
            .get_certificate_document(&cert.identifier)
            .await
            .unwrap()
            .unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn issuing_twice_returns_the_same_identifier() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 650).await;
        let issuer = issuer(&db);

        let first = issuer.issue("p1", "s1").await.unwrap();
        let second = issuer.issue("p1", "s1").await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(
            first.certificate().identifier,
            second.certificate().identifier
        );
        assert_eq!(db.list_certificates_for_owner("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_issuance_creates_one_certificate() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 600).await;
        let issuer = issuer(&db);

        let (a, b) = tokio::join!(issuer.issue("p1", "s1"), issuer.issue("p1", "s1"));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.certificate().identifier, b.certificate().identifier);
        assert_eq!(db.list_certificates_for_owner("s1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn incomplete_goal_is_ineligible_and_creates_nothing() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 540).await;

        let err = issuer(&db).issue("p1", "s1").await.unwrap_err();
        let CertificateError::IneligibleGoal {
            logged_hours,
            required_hours,
        } = err
        else {
            panic!("expected IneligibleGoal, got {err:?}");
        };
        assert_eq!(logged_hours, 9.0);
        assert_eq!(required_hours, 10.0);
        assert!(db.get_certificate_for_plan("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn one_minute_short_reports_hours_below_target() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 599).await;

        let err = issuer(&db).issue("p1", "s1").await.unwrap_err();
        let CertificateError::IneligibleGoal {
            logged_hours,
            required_hours,
        } = err
        else {
            panic!("expected IneligibleGoal, got {err:?}");
        };
        assert!(logged_hours < required_hours);
        assert_eq!(logged_hours, 9.9);
    }

    #[tokio::test]
    async fn unvalidated_sessions_do_not_count() {
        let db = seeded_db().await;
        db.record_session(&NewStudySession {
            id: "ss1",
            student_id: "s1",
            subject: "Civil Law",
            started_at: 1_700_000_000,
            duration_minutes: 900,
            is_validated: false,
        })
        .await
        .unwrap();

        let err = issuer(&db).issue("p1", "s1").await.unwrap_err();
        assert!(matches!(err, CertificateError::IneligibleGoal { .. }));
    }

    #[tokio::test]
    async fn minimum_hours_floor_applies_to_small_targets() {
        let db = seeded_db().await;
        db.create_plan(&NewStudyPlan {
            id: "p-small",
            student_id: "s1",
            mentor_id: "t1",
            target_subject: "Civil Law",
            target_hours: 0.25,
            deadline: None,
        })
        .await
        .unwrap();
        log_minutes(&db, "ss1", 30).await;

        let err = issuer(&db).issue("p-small", "s1").await.unwrap_err();
        assert!(matches!(
            err,
            CertificateError::IneligibleGoal { required_hours, .. } if required_hours == 1.0
        ));

        log_minutes(&db, "ss2", 30).await;
        assert!(issuer(&db).issue("p-small", "s1").await.unwrap().is_new());
    }

    #[tokio::test]
    async fn unknown_plan_is_goal_not_found() {
        let db = seeded_db().await;
        let err = issuer(&db).issue("missing", "s1").await.unwrap_err();
        assert!(matches!(err, CertificateError::GoalNotFound(_)));
    }

    #[tokio::test]
    async fn plan_of_another_student_is_goal_not_found() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 600).await;

        let err = issuer(&db).issue("p1", "s2").await.unwrap_err();
        assert!(matches!(err, CertificateError::GoalNotFound(_)));
        assert!(db.get_certificate_for_plan("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn render_failure_is_reported_and_nothing_stored() {
        let db = seeded_db().await;
        log_minutes(&db, "ss1", 600).await;
        let issuer = CertificateIssuer::new(
            db.clone(),
            Arc::new(FailingRenderer),
            IssuerSettings {
                minimum_hours: 1.0,
                public_base_url: "https://target.saas".into(),
            },
        );

        let err = issuer.issue("p1", "s1").await.unwrap_err();
        assert!(matches!(err, CertificateError::Render(_)));
        assert!(db.get_certificate_for_plan("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn storage_outage_is_a_storage_error() {
        let db = seeded_db().await;
        db.pool().close().await;

        let err = issuer(&db).issue("p1", "s1").await.unwrap_err();
        assert!(matches!(err, CertificateError::Storage(_)));
    }
}
