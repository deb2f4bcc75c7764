use super::DeleteOutcome;
use crate::{body, params, ApiError, CurrentUser, ServiceState};
use acct_core::{ListFilter, Page, Partner, PartnerDraft};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

pub async fn create(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    payload: Result<Json<PartnerDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Partner>), ApiError> {
    let partner = state.engine.create_partner(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn list(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Page<Partner>>, ApiError> {
    Ok(Json(state.engine.list_partners(&params(query)?).await?))
}

pub async fn read(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<Partner>, ApiError> {
    Ok(Json(state.engine.partner(id).await?))
}

pub async fn update(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
    payload: Result<Json<PartnerDraft>, JsonRejection>,
) -> Result<Json<Partner>, ApiError> {
    Ok(Json(state.engine.update_partner(id, body(payload)?).await?))
}

pub async fn delete(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state.engine.delete_partner(id).await?;
    Ok(Json(DeleteOutcome::deleted(id)))
}
