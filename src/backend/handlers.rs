// src/backend/handlers.rs
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Deserialize;

use crate::backend::gateway::{CreateGoal, CreateOutcome, CreateRecord, GatewayError};
use crate::backend::response;
use crate::backend::AppState;

#[derive(Debug, Deserialize)]
pub struct IdParam {
    pub id: Option<String>,
}

type HandlerResult = Result<Response, GatewayError>;

pub async fn dashboard_handler(State(state): State<AppState>) -> HandlerResult {
    let view = state.gateway.snapshot().await?;
    Ok(response::ok(view))
}

/* ========== Goals ========== */

pub async fn list_goals_handler(State(state): State<AppState>) -> HandlerResult {
    Ok(response::ok(state.gateway.list_goals().await?))
}

pub async fn create_goal_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateGoal>, JsonRejection>,
) -> HandlerResult {
    let done = state.gateway.create_goal(body(payload)?).await?;
    Ok(response::with_msg(StatusCode::CREATED, "Goal created", done.entity))
}

pub async fn delete_goal_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let done = state.gateway.delete_goal(&id).await?;
    Ok(response::with_msg(StatusCode::OK, "Goal deleted", done.entity))
}

pub async fn delete_goal_by_query_handler(
    State(state): State<AppState>,
    Query(param): Query<IdParam>,
) -> HandlerResult {
    let done = state.gateway.delete_goal(&required_id(param)?).await?;
    Ok(response::with_msg(StatusCode::OK, "Goal deleted", done.entity))
}

/* ========== Records ========== */

pub async fn list_records_handler(State(state): State<AppState>) -> HandlerResult {
    Ok(response::ok(state.gateway.list_records().await?))
}

pub async fn create_record_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateRecord>, JsonRejection>,
) -> HandlerResult {
    let done = state.gateway.create_record(body(payload)?).await?;
    Ok(response::with_msg(StatusCode::CREATED, "Record created", done.entity))
}

pub async fn delete_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let done = state.gateway.delete_record(&id).await?;
    Ok(response::with_msg(StatusCode::OK, "Record deleted", done.entity))
}

pub async fn delete_record_by_query_handler(
    State(state): State<AppState>,
    Query(param): Query<IdParam>,
) -> HandlerResult {
    let done = state.gateway.delete_record(&required_id(param)?).await?;
    Ok(response::with_msg(StatusCode::OK, "Record deleted", done.entity))
}

/* ========== Outcomes ========== */

pub async fn list_outcomes_handler(State(state): State<AppState>) -> HandlerResult {
    Ok(response::ok(state.gateway.list_outcomes().await?))
}

pub async fn create_outcome_handler(
    State(state): State<AppState>,
    payload: Result<Json<CreateOutcome>, JsonRejection>,
) -> HandlerResult {
    let done = state.gateway.create_outcome(body(payload)?).await?;
    Ok(response::with_msg(StatusCode::CREATED, "Outcome created", done.entity))
}

pub async fn delete_outcome_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult {
    let done = state.gateway.delete_outcome(&id).await?;
    Ok(response::with_msg(StatusCode::OK, "Outcome deleted", done.entity))
}

pub async fn delete_outcome_by_query_handler(
    State(state): State<AppState>,
    Query(param): Query<IdParam>,
) -> HandlerResult {
    let done = state.gateway.delete_outcome(&required_id(param)?).await?;
    Ok(response::with_msg(StatusCode::OK, "Outcome deleted", done.entity))
}

pub async fn health_handler(State(state): State<AppState>) -> Response {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => response::ok("Backend is running"),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            response::failure(StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

// A malformed body is a client mistake, reported in the usual envelope.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GatewayError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| GatewayError::Validation(rejection.body_text()))
}

fn required_id(param: IdParam) -> Result<String, GatewayError> {
    param
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| GatewayError::Validation("id is required".into()))
}
