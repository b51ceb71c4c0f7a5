//! API error type and its HTTP mapping.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::certificates::CertificateError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("study goal not completed")]
    Ineligible {
        logged_hours: f64,
        required_hours: f64,
    },
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Ineligible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CertificateError> for ApiError {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::GoalNotFound(_) | CertificateError::NotFound => Self::NotFound,
            CertificateError::IneligibleGoal {
                logged_hours,
                required_hours,
            } => Self::Ineligible {
                logged_hours,
                required_hours,
            },
            CertificateError::Render(e) => Self::Internal(e.to_string()),
            CertificateError::Storage(e) if e.is_unavailable() => Self::Unavailable(e.to_string()),
            CertificateError::Storage(_) => Self::NotFound,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Ineligible {
                logged_hours,
                required_hours,
            } => serde_json::json!({
                "error": self.to_string(),
                "logged_hours": logged_hours,
                "required_hours": required_hours,
            }),
            Self::Unavailable(detail) => {
                warn!(%detail, "Request failed: storage unavailable");
                serde_json::json!({ "error": "service unavailable, retry later" })
            }
            Self::Internal(detail) => {
                error!(%detail, "Request failed");
                serde_json::json!({ "error": "internal error" })
            }
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        if matches!(self, Self::Unavailable(_)) {
            return (status, [(header::RETRY_AFTER, "5")], Json(body)).into_response();
        }
        (status, Json(body)).into_response()
    }
}
