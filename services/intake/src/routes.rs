use crate::infra::{AppState, SandboxState};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use guarantor_intake::intake::{
    digits_only, SubmissionPayload, SubmissionResponse, ZipLookupResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub(crate) struct ZipQuery {
    #[serde(default)]
    pub(crate) zip: String,
}

/// Endpoints standing in for the remote processing service.
pub(crate) fn sandbox_router(state: SandboxState) -> Router {
    Router::new()
        .route("/externalform/pg", post(submission_endpoint))
        .route("/externalform/zip", get(zip_lookup_endpoint))
        .with_state(state)
}

pub(crate) fn with_operational_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn submission_endpoint(
    State(state): State<SandboxState>,
    Json(payload): Json<SubmissionPayload>,
) -> (StatusCode, Json<SubmissionResponse>) {
    let rejection = if payload.token.trim().is_empty() {
        Some((StatusCode::UNAUTHORIZED, "Missing or expired access token."))
    } else if payload.guarantors.is_empty() {
        Some((
            StatusCode::UNPROCESSABLE_ENTITY,
            "At least one guarantor is required.",
        ))
    } else {
        None
    };

    if let Some((status, message)) = rejection {
        warn!(%status, message, "sandbox rejected submission");
        return (
            status,
            Json(SubmissionResponse {
                success: false,
                message: Some(message.to_string()),
            }),
        );
    }

    let guarantors = payload.guarantors.len();
    let received = state.record(payload);
    info!(guarantors, received, "sandbox accepted submission");

    (
        StatusCode::OK,
        Json(SubmissionResponse {
            success: true,
            message: Some(format!(
                "Received {guarantors} guarantor(s). You may close this page."
            )),
        }),
    )
}

pub(crate) async fn zip_lookup_endpoint(
    State(state): State<SandboxState>,
    Query(query): Query<ZipQuery>,
) -> Json<ZipLookupResponse> {
    if digits_only(&query.zip).len() < 5 {
        return Json(ZipLookupResponse {
            success: false,
            results: None,
            message: Some("ZIP must contain 5 digits".to_string()),
        });
    }

    Json(state.directory.response_for(&query.zip))
}
