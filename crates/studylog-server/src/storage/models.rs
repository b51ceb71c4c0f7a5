//! Data models for studylog storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform role of a user, as stored in `users.role` and carried in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub study_objective: Option<String>,
    pub is_approved: i64,
    pub created_at: i64,
}

impl User {
    /// Parsed role; `None` only if the row was written outside the schema's
    /// CHECK constraint.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudyPlan {
    pub id: String,
    pub student_id: String,
    pub mentor_id: String,
    pub target_subject: String,
    pub target_hours: f64,
    pub status: String,
    pub deadline: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudySession {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub started_at: i64,
    pub duration_minutes: i64,
    pub is_validated: i64,
    pub created_at: i64,
}

/// Certificate metadata. The rendered PDF lives in the same row but is only
/// loaded on explicit download.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub identifier: String,
    pub owner_id: String,
    pub plan_id: String,
    pub student_name: String,
    pub subject: String,
    pub total_hours: f64,
    pub issued_at: i64,
    pub revoked: i64,
    pub revoked_at: Option<i64>,
}

impl Certificate {
    pub const fn is_revoked(&self) -> bool {
        self.revoked != 0
    }
}
