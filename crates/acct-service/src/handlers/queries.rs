//! JSON lookups behind dependent pickers, plus partner reconciliation.

use crate::{params, ApiError, CurrentUser, ServiceState};
use acct_core::{DiscrepancyReport, PartnerRole};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOptions {
    pub items: Vec<SelectOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegalEntitiesQuery {
    pub partner: Option<Uuid>,
}

pub async fn legal_entities(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<LegalEntitiesQuery>, QueryRejection>,
) -> Result<Json<SelectOptions>, ApiError> {
    let query = params(query)?;
    let items = state
        .engine
        .legal_entities(query.partner)
        .await?
        .into_iter()
        .map(|entity| SelectOption {
            id: entity.id,
            name: entity.name,
        })
        .collect();
    Ok(Json(SelectOptions { items }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartnersQuery {
    pub role: PartnerRole,
}

pub async fn partners(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<PartnersQuery>, QueryRejection>,
) -> Result<Json<SelectOptions>, ApiError> {
    let query = params(query)?;
    let items = state
        .engine
        .partners_by_role(query.role)
        .await?
        .into_iter()
        .map(|partner| SelectOption {
            id: partner.id,
            name: partner.name,
        })
        .collect();
    Ok(Json(SelectOptions { items }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscrepancyQuery {
    pub partner: Uuid,
    pub role: PartnerRole,
}

pub async fn discrepancy(
    _user: CurrentUser,
    State(state): State<ServiceState>,
    query: Result<Query<DiscrepancyQuery>, QueryRejection>,
) -> Result<Json<DiscrepancyReport>, ApiError> {
    let query = params(query)?;
    Ok(Json(
        state.engine.discrepancy(query.partner, query.role).await?,
    ))
}
