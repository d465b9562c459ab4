//! REST surface over the audit ledger

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::error;

use crate::audit::{ActionData, AuditLogger, Block, DomainEvent, ValidationResult};
use crate::config::AppConfig;
use crate::error::LedgerError;

#[derive(Clone)]
pub struct AppState {
    pub logger: AuditLogger,
    pub config: AppConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/breweries", get(list_breweries))
        .route(
            "/breweries/:brewery_id/ledger",
            get(timeline).post(open_brewery),
        )
        .route("/breweries/:brewery_id/ledger/blocks", post(append_block))
        .route("/breweries/:brewery_id/ledger/events", post(append_event))
        .route("/breweries/:brewery_id/ledger/import", post(import_block))
        .route("/breweries/:brewery_id/ledger/verify", get(verify_ledger))
        .with_state(state)
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match &self {
            LedgerError::Conflict { .. } => StatusCode::CONFLICT,
            LedgerError::RejectedBlock(_) | LedgerError::ValidationError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LedgerError::ConfigError(_)
            | LedgerError::DatabaseError(_)
            | LedgerError::SerializationError(_) => {
                error!("Ledger request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TimelineParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub user: String,
    pub event: DomainEvent,
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "brewery-ledger",
        "timestamp": chrono::Utc::now()
    }))
}

async fn list_breweries(State(state): State<AppState>) -> Result<Json<Vec<String>>, LedgerError> {
    Ok(Json(state.logger.breweries().await?))
}

async fn open_brewery(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
) -> Result<Json<Block>, LedgerError> {
    Ok(Json(state.logger.open_brewery(&brewery_id).await?))
}

async fn timeline(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<Vec<Block>>, LedgerError> {
    let limit = params.limit.unwrap_or(state.config.timeline_limit);
    Ok(Json(state.logger.timeline(&brewery_id, limit).await?))
}

async fn append_block(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
    Json(data): Json<ActionData>,
) -> Result<(StatusCode, Json<Block>), LedgerError> {
    let block = state.logger.record(&brewery_id, data).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn append_event(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<Block>), LedgerError> {
    let block = state
        .logger
        .record_event(&brewery_id, &request.event, &request.user)
        .await?;
    Ok((StatusCode::CREATED, Json(block)))
}

async fn import_block(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
    Json(block): Json<Block>,
) -> Result<Json<Block>, LedgerError> {
    Ok(Json(state.logger.import_block(&brewery_id, block).await?))
}

async fn verify_ledger(
    State(state): State<AppState>,
    Path(brewery_id): Path<String>,
) -> Result<Json<ValidationResult>, LedgerError> {
    Ok(Json(state.logger.verify_brewery(&brewery_id).await?))
}
