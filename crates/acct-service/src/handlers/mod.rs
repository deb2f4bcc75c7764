//! Route handlers, one module per record family.

pub mod applications;
pub mod auth;
pub mod ledger;
pub mod legal_entities;
pub mod partners;
pub mod queries;

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub id: Uuid,
    pub status: &'static str,
}

impl DeleteOutcome {
    pub(crate) fn deleted(id: Uuid) -> Self {
        Self {
            id,
            status: "deleted",
        }
    }
}
