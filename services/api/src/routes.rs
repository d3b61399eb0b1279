use crate::infra::{AppState, MemoryService};
use academia::academics::{academic_router, ActivityEntry, CatalogImporter, ImportSummary};
use academia::error::AppError;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_academic_routes(service: Arc<MemoryService>) -> axum::Router {
    academic_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/academics/activity", get(activity_endpoint))
        .route("/api/v1/academics/catalog", post(catalog_endpoint))
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

/// Committed writes, oldest first.
pub(crate) async fn activity_endpoint(
    Extension(state): Extension<AppState>,
) -> Json<Vec<ActivityEntry>> {
    Json(state.activity.entries())
}

/// Loads a curriculum CSV sent as the request body.
pub(crate) async fn catalog_endpoint(
    Extension(state): Extension<AppState>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    let summary = CatalogImporter::from_reader(body.as_bytes(), state.store.as_ref())?;
    Ok(Json(summary))
}
