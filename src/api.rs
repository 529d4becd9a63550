use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;

use pharmledger_core::{EntryId, LedgerEntry, LedgerEntryCommand, SetupCommand};

use crate::{
    error::AppError,
    export::EXPORT_FILENAME,
    service::LedgerService,
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService>,
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Serialize)]
struct ApiError {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
pub struct AdminAuth {
    pub password: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add", post(add_entry))
        .route("/delete/:id", delete(delete_entry))
        .route("/update/:id", put(update_entry))
        .route("/history", get(history))
        .route("/latest", get(latest))
        .route("/validate-admin", post(validate_admin))
        .route("/check-setup", get(check_setup))
        .route("/setup", post(setup))
        .route("/export", get(export))
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .with_state(state)
}

async fn add_entry(
    State(state): State<AppState>,
    Json(command): Json<LedgerEntryCommand>,
) -> Result<impl IntoResponse, AppError> {
    let id = state.service.add_entry(command)?;
    Ok(Json(json!({ "message": "Transaction added successfully", "id": id })))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
) -> Result<impl IntoResponse, AppError> {
    state.service.delete_entry(id)?;
    Ok(Json(json!({ "message": "Deleted successfully" })))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<EntryId>,
    Json(command): Json<LedgerEntryCommand>,
) -> Result<impl IntoResponse, AppError> {
    state.service.update_entry(id, &command)?;
    Ok(Json(json!({ "message": "Transaction updated successfully" })))
}

async fn history(State(state): State<AppState>) -> Result<Json<Vec<LedgerEntry>>, AppError> {
    Ok(Json(state.service.history()?))
}

async fn latest(State(state): State<AppState>) -> Result<Json<Option<LedgerEntry>>, AppError> {
    Ok(Json(state.service.latest()?))
}

async fn validate_admin(
    State(state): State<AppState>,
    Json(auth): Json<AdminAuth>,
) -> Result<impl IntoResponse, AppError> {
    let valid = state.service.validate_admin(&auth.password)?;
    Ok(Json(json!({ "valid": valid })))
}

async fn check_setup(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let is_setup = state.service.is_setup()?;
    Ok(Json(json!({ "is_setup": is_setup })))
}

async fn setup(
    State(state): State<AppState>,
    Json(command): Json<SetupCommand>,
) -> Result<impl IntoResponse, AppError> {
    state.service.setup(&command)?;
    Ok(Json(json!({ "success": true })))
}

async fn export(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.service.export_csv()?;
    let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
