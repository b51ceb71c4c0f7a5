//! Router and handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use studylog_core::Config;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::error::ApiError;
use super::pages;
use crate::auth::{Claims, JwtManager};
use crate::certificates::{
    CertificateIssuer, CertificateLedger, CertificateVerifier, IssuerSettings, PdfRenderer,
};
use crate::storage::{Certificate, DatabaseError, Role, StudyDatabase};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: StudyDatabase,
    pub issuer: CertificateIssuer,
    pub verifier: CertificateVerifier,
    pub ledger: CertificateLedger,
    pub jwt: Arc<JwtManager>,
    pub brand_name: String,
}

impl AppState {
    pub fn new(db: StudyDatabase, config: &Config, jwt: Arc<JwtManager>) -> Self {
        let renderer = Arc::new(PdfRenderer::new(config.certificates.brand_name.clone()));
        Self {
            issuer: CertificateIssuer::new(
                db.clone(),
                renderer,
                IssuerSettings::from_config(config),
            ),
            verifier: CertificateVerifier::new(db.clone()),
            ledger: CertificateLedger::new(db.clone()),
            db,
            jwt,
            brand_name: config.certificates.brand_name.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/verify/{identifier}", get(verify))
        .route("/api/plans/{plan_id}/certificate", post(issue_certificate))
        .route("/api/certificates", get(list_certificates))
        .route("/api/certificates/{identifier}/pdf", get(download_certificate))
        .route(
            "/api/certificates/{identifier}/revoke",
            post(revoke_certificate),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Returns true if the request looks like a browser (wants HTML).
fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// `GET /healthz`
pub async fn health(State(state): State<AppState>) -> Response {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable").into_response()
        }
    }
}

/// `GET /verify/{identifier}`: public. HTML for browsers, JSON otherwise.
pub async fn verify(
    Path(identifier): Path<String>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let html = wants_html(&headers);
    match state.verifier.verify(&identifier).await {
        Ok(cert) if html => Html(pages::verification(&state.brand_name, &cert)).into_response(),
        Ok(cert) => Json(cert).into_response(),
        Err(e) => {
            let err = ApiError::from(e);
            if html {
                let status = err.status();
                if let ApiError::Unavailable(detail) = &err {
                    warn!(%detail, "Verification page unavailable");
                }
                (status, Html(pages::lookup_failed(&state.brand_name, status))).into_response()
            } else {
                err.into_response()
            }
        }
    }
}

/// `POST /api/plans/{plan_id}/certificate`
///
/// Students issue for their own plans; mentors for plans they supervise;
/// admins for any plan. 201 on first issue, 200 when the plan already has one.
pub async fn issue_certificate(
    State(state): State<AppState>,
    claims: Claims,
    Path(plan_id): Path<String>,
) -> Result<(StatusCode, Json<Certificate>), ApiError> {
    let student_id = match claims.role {
        Role::Student => claims.sub.clone(),
        Role::Teacher | Role::Admin => {
            let plan = match state.db.get_plan(&plan_id).await {
                Ok(plan) => plan,
                Err(DatabaseError::NotFound(_)) => return Err(ApiError::NotFound),
                Err(e) => return Err(ApiError::Unavailable(e.to_string())),
            };
            if claims.role == Role::Teacher && plan.mentor_id != claims.sub {
                return Err(ApiError::NotFound);
            }
            plan.student_id
        }
    };

    let issuance = state.issuer.issue(&plan_id, &student_id).await?;
    let status = if issuance.is_new() {
        info!(requested_by = %claims.sub, %plan_id, "Certificate created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(issuance.into_certificate())))
}

/// `GET /api/certificates`: the caller's own certificates.
pub async fn list_certificates(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    Ok(Json(state.ledger.list_for_owner(&claims.sub).await?))
}

/// `GET /api/certificates/{identifier}/pdf`
///
/// Someone else's certificate is reported as missing.
pub async fn download_certificate(
    State(state): State<AppState>,
    claims: Claims,
    Path(identifier): Path<String>,
) -> Result<Response, ApiError> {
    let (cert, document) = state.ledger.document(&identifier).await?;
    if !claims.is_self_or_admin(&cert.owner_id) {
        return Err(ApiError::NotFound);
    }

    let disposition = format!(
        "attachment; filename=\"certificate_{}.pdf\"",
        cert.identifier
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    )
        .into_response())
}

/// `POST /api/certificates/{identifier}/revoke`: admin only.
pub async fn revoke_certificate(
    State(state): State<AppState>,
    claims: Claims,
    Path(identifier): Path<String>,
) -> Result<Json<Certificate>, ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let cert = state.ledger.revoke(&identifier).await?;
    info!(revoked_by = %claims.sub, identifier = %cert.identifier, "Certificate revoked by admin");
    Ok(Json(cert))
}
