use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::desk::LeadDesk;
use crate::error::LeadError;
use crate::ingest::types::HarvestReport;
use crate::lead::{Lead, LeadStatus};

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<LeadDesk>,
}

impl AppState {
    pub fn new(desk: LeadDesk) -> Self {
        Self {
            desk: Arc::new(desk),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/leads", get(list_leads))
        .route("/leads/harvest", post(harvest))
        .route("/leads/{id}", get(get_lead))
        .route("/leads/{id}/recipe", post(generate_recipe))
        .route("/leads/{id}/status", patch(set_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// HTTP face of [`LeadError`].
pub struct ApiError(LeadError);

impl From<LeadError> for ApiError {
    fn from(e: LeadError) -> Self {
        Self(e)
    }
}

#[derive(serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            LeadError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            LeadError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
            LeadError::GenerationFailed(_) => (StatusCode::BAD_GATEWAY, "generation_failed"),
            LeadError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage"),
        };
        let body = ErrorBody {
            error: kind,
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(serde::Deserialize)]
struct ListQuery {
    #[serde(default)]
    status: Option<LeadStatus>,
}

async fn list_leads(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    Ok(Json(state.desk.list(q.status)?))
}

async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.desk.get(id)?))
}

#[derive(serde::Serialize)]
struct HarvestOut {
    leads: Vec<Lead>,
    report: HarvestReport,
}

async fn harvest(State(state): State<AppState>) -> Result<Json<HarvestOut>, ApiError> {
    let (leads, report) = state.desk.harvest().await?;
    Ok(Json(HarvestOut { leads, report }))
}

async fn generate_recipe(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lead>, ApiError> {
    Ok(Json(state.desk.generate_recipe(id).await?))
}

#[derive(serde::Deserialize)]
struct StatusReq {
    status: LeadStatus,
    user: String,
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusReq>,
) -> Response {
    let user = body.user.trim();
    if user.is_empty() {
        let err = ErrorBody {
            error: "bad_request",
            message: "user must not be empty".to_string(),
            retryable: false,
        };
        return (StatusCode::BAD_REQUEST, Json(err)).into_response();
    }
    match state.desk.set_status(id, body.status, user) {
        Ok(lead) => Json(lead).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
