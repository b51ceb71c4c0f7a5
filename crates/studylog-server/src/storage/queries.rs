//! Queries over the platform tables the certificate issuer reads.
//!
//! Account, plan and session management screens own these tables; the
//! inserts here exist for seeding and tests.

use studylog_core::db::unix_timestamp;

use super::db::{DatabaseError, StudyDatabase};
use super::models::{Role, StudyPlan, StudySession, User};

/// Parameters for creating a user.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub role: Role,
    pub study_objective: Option<&'a str>,
    pub is_approved: bool,
}

/// Parameters for creating a study plan.
pub struct NewStudyPlan<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub mentor_id: &'a str,
    pub target_subject: &'a str,
    pub target_hours: f64,
    pub deadline: Option<i64>,
}

/// Parameters for logging a study session.
pub struct NewStudySession<'a> {
    pub id: &'a str,
    pub student_id: &'a str,
    pub subject: &'a str,
    pub started_at: i64,
    pub duration_minutes: i64,
    pub is_validated: bool,
}

impl StudyDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user.
    pub async fn create_user(&self, params: &NewUser<'_>) -> Result<User, DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role, study_objective, is_approved, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.name)
        .bind(params.email)
        .bind(params.role.as_str())
        .bind(params.study_objective)
        .bind(i64::from(params.is_approved))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_user(params.id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    // =========================================================================
    // Study plan queries
    // =========================================================================

    /// Create a new study plan in the `active` state.
    pub async fn create_plan(&self, params: &NewStudyPlan<'_>) -> Result<StudyPlan, DatabaseError> {
        sqlx::query(
            "INSERT INTO study_plans (id, student_id, mentor_id, target_subject, target_hours, deadline, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.student_id)
        .bind(params.mentor_id)
        .bind(params.target_subject)
        .bind(params.target_hours)
        .bind(params.deadline)
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        self.get_plan(params.id).await
    }

    /// Get a study plan by ID.
    pub async fn get_plan(&self, id: &str) -> Result<StudyPlan, DatabaseError> {
        sqlx::query_as::<_, StudyPlan>("SELECT * FROM study_plans WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Study plan {id}")))
    }

    // =========================================================================
    // Study session queries
    // =========================================================================

    /// Log a study session.
    pub async fn record_session(
        &self,
        params: &NewStudySession<'_>,
    ) -> Result<StudySession, DatabaseError> {
        sqlx::query(
            "INSERT INTO study_sessions (id, student_id, subject, started_at, duration_minutes, is_validated, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.student_id)
        .bind(params.subject)
        .bind(params.started_at)
        .bind(params.duration_minutes)
        .bind(i64::from(params.is_validated))
        .bind(unix_timestamp())
        .execute(self.pool())
        .await?;

        sqlx::query_as::<_, StudySession>("SELECT * FROM study_sessions WHERE id = ?")
            .bind(params.id)
            .fetch_one(self.pool())
            .await
            .map_err(Into::into)
    }

    /// Total validated minutes a student has logged for a subject.
    pub async fn logged_minutes(
        &self,
        student_id: &str,
        subject: &str,
    ) -> Result<i64, DatabaseError> {
        let (minutes,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(duration_minutes), 0) FROM study_sessions WHERE student_id = ? AND subject = ? AND is_validated = 1",
        )
        .bind(student_id)
        .bind(subject)
        .fetch_one(self.pool())
        .await?;

        Ok(minutes)
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(self.pool()).await?;
        Ok(())
    }
}
