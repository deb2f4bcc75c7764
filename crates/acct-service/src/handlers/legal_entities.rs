use super::DeleteOutcome;
use crate::{body, params, ApiError, CurrentUser, ServiceState};
use acct_core::{LegalEntity, LegalEntityDraft, ListFilter, Page};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

pub async fn create(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    payload: Result<Json<LegalEntityDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<LegalEntity>), ApiError> {
    let entity = state.engine.create_legal_entity(body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

pub async fn list(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Page<LegalEntity>>, ApiError> {
    Ok(Json(state.engine.list_legal_entities(&params(query)?).await?))
}

pub async fn read(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<LegalEntity>, ApiError> {
    Ok(Json(state.engine.legal_entity(id).await?))
}

pub async fn update(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
    payload: Result<Json<LegalEntityDraft>, JsonRejection>,
) -> Result<Json<LegalEntity>, ApiError> {
    Ok(Json(
        state.engine.update_legal_entity(id, body(payload)?).await?,
    ))
}

pub async fn delete(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state.engine.delete_legal_entity(id).await?;
    Ok(Json(DeleteOutcome::deleted(id)))
}
