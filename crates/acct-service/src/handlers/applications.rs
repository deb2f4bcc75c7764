//! Application routes.
//!
//! Validation failures come back as 422 with per-field messages. Anything
//! else going wrong during a save is logged and the client is sent to the
//! failure page instead of seeing the raw error.

use super::DeleteOutcome;
use crate::{body, params, ApiError, CurrentUser, ServiceState};
use acct_core::{AcctError, Application, ApplicationDraft, ApplicationView, ListFilter, Page};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

pub const FAILURE_PATH: &str = "/application/failure/";

fn saved(status: StatusCode, result: Result<Application, AcctError>) -> Result<Response, ApiError> {
    match result {
        Ok(application) => Ok((status, Json(application)).into_response()),
        Err(err @ (AcctError::Storage(_) | AcctError::Overflow(_))) => {
            error!(error = %err, "application save failed");
            Ok(Redirect::to(FAILURE_PATH).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn create(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    payload: Result<Json<ApplicationDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = body(payload)?;
    saved(
        StatusCode::CREATED,
        state.engine.create_application(draft).await,
    )
}

pub async fn list(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<ListFilter>, QueryRejection>,
) -> Result<Json<Page<ApplicationView>>, ApiError> {
    Ok(Json(state.engine.list_applications(&params(query)?).await?))
}

pub async fn read(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<ApplicationView>, ApiError> {
    Ok(Json(state.engine.application(id).await?))
}

pub async fn update(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
    payload: Result<Json<ApplicationDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = body(payload)?;
    saved(StatusCode::OK, state.engine.update_application(id, draft).await)
}

pub async fn delete(
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    State(state): State<ServiceState>,
) -> Result<Json<DeleteOutcome>, ApiError> {
    state.engine.delete_application(id).await?;
    Ok(Json(DeleteOutcome::deleted(id)))
}

#[derive(Debug, Clone, Serialize)]
pub struct FailurePage {
    pub status: &'static str,
    pub message: &'static str,
}

pub async fn failure() -> Json<FailurePage> {
    Json(FailurePage {
        status: "failed",
        message: "The application could not be saved. Please try again later.",
    })
}
