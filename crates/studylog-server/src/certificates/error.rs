//! Certificate error types.

use studylog_core::db::DatabaseError;
use thiserror::Error;

use super::render::RenderError;

/// Failures of certificate operations.
///
/// A repeated issuance for the same plan is not an error; it is reported as
/// [`super::Issuance::Existing`].
#[derive(Debug, Error)]
pub enum CertificateError {
    /// The plan does not exist or belongs to another student.
    #[error("study goal {0} not found")]
    GoalNotFound(String),

    /// The plan's logged hours have not reached the required amount.
    #[error("study goal not completed: {logged_hours} of {required_hours} hours logged")]
    IneligibleGoal {
        logged_hours: f64,
        required_hours: f64,
    },

    /// No certificate matches the identifier.
    #[error("certificate not found")]
    NotFound,

    #[error("failed to render certificate: {0}")]
    Render(#[from] RenderError),

    /// The store could not be reached or rejected the query.
    #[error("certificate storage unavailable: {0}")]
    Storage(#[from] DatabaseError),
}
