//! Income and outcome routes.

use super::DeleteOutcome;
use crate::{body, params, ApiError, CurrentUser, ServiceState};
use acct_core::{Income, IncomeDraft, ListFilter, Outcome, OutcomeDraft, Page};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

pub async fn create_income(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    payload: Result<Json<IncomeDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Income>), ApiError> {
    let income = state.engine.create_income(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(income)))
}

pub async fn list_incomes(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Page<Income>>, ApiError> {
    Ok(Json(state.engine.list_incomes(&params(query)?).await?))
}

pub async fn read_income(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<Income>, ApiError> {
    Ok(Json(state.engine.income(id).await?))
}

pub async fn update_income(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
    payload: Result<Json<IncomeDraft>, JsonRejection>,
) -> Result<Json<Income>, ApiError> {
    Ok(Json(state.engine.update_income(id, body(payload)?).await?))
}

pub async fn delete_income(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state.engine.delete_income(id).await?;
    Ok(Json(DeleteOutcome::deleted(id)))
}

pub async fn create_outcome(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    payload: Result<Json<OutcomeDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let outcome = state.engine.create_outcome(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn list_outcomes(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Page<Outcome>>, ApiError> {
    Ok(Json(state.engine.list_outcomes(&params(query)?).await?))
}

pub async fn read_outcome(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<Outcome>, ApiError> {
    Ok(Json(state.engine.outcome(id).await?))
}

pub async fn update_outcome(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
    payload: Result<Json<OutcomeDraft>, JsonRejection>,
) -> Result<Json<Outcome>, ApiError> {
    Ok(Json(state.engine.update_outcome(id, body(payload)?).await?))
}

pub async fn delete_outcome(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state.engine.delete_outcome(id).await?;
    Ok(Json(DeleteOutcome::deleted(id)))
}
