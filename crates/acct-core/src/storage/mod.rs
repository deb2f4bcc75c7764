//! Storage contract for accounting records.
//!
//! Two backends implement it:
//! - [`MemoryStorage`] keeps everything in process memory (tests, local runs)
//! - [`PostgresStorage`] is the transactional source of truth
//!
//! Both apply the same delete rules: removing a partner removes its legal
//! entities, incomes and outcomes, while applications keep existing with the
//! reference cleared.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

use crate::types::{Application, Income, LegalEntity, Outcome, Partner, User};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Backend selection.
#[derive(Debug, Clone, Default)]
pub enum StorageConfig {
    /// Keep all records in process memory only.
    #[default]
    Memory,
    /// Persist records in PostgreSQL; schema is created on startup.
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

impl StorageConfig {
    pub fn postgres(database_url: impl Into<String>, max_connections: u32) -> Self {
        Self::Postgres {
            database_url: database_url.into(),
            max_connections,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }

    pub async fn bootstrap(&self) -> StorageResult<Arc<dyn AccountingStorage>> {
        match self {
            Self::Memory => Ok(Arc::new(MemoryStorage::new())),
            Self::Postgres {
                database_url,
                max_connections,
            } => Ok(Arc::new(
                PostgresStorage::connect(database_url, *max_connections).await?,
            )),
        }
    }
}

#[async_trait]
pub trait PartnerStore: Send + Sync {
    /// Insert a partner; names are unique.
    async fn insert_partner(&self, partner: &Partner) -> StorageResult<()>;
    async fn update_partner(&self, partner: &Partner) -> StorageResult<()>;
    async fn get_partner(&self, id: Uuid) -> StorageResult<Option<Partner>>;
    async fn list_partners(&self) -> StorageResult<Vec<Partner>>;
    /// Remove a partner with its legal entities, incomes and outcomes.
    /// Application references to the partner or its legal entities are cleared.
    async fn delete_partner(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait LegalEntityStore: Send + Sync {
    /// Insert a legal entity; names are unique.
    async fn insert_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()>;
    async fn update_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()>;
    async fn get_legal_entity(&self, id: Uuid) -> StorageResult<Option<LegalEntity>>;
    async fn list_legal_entities(&self) -> StorageResult<Vec<LegalEntity>>;
    /// Remove a legal entity; applications sending or receiving through it keep
    /// existing with the reference cleared.
    async fn delete_legal_entity(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert_application(&self, application: &Application) -> StorageResult<()>;
    async fn update_application(&self, application: &Application) -> StorageResult<()>;
    async fn get_application(&self, id: Uuid) -> StorageResult<Option<Application>>;
    async fn list_applications(&self) -> StorageResult<Vec<Application>>;
    async fn delete_application(&self, id: Uuid) -> StorageResult<bool>;
}

/// Income and outcome entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_income(&self, income: &Income) -> StorageResult<()>;
    async fn update_income(&self, income: &Income) -> StorageResult<()>;
    async fn get_income(&self, id: Uuid) -> StorageResult<Option<Income>>;
    async fn list_incomes(&self) -> StorageResult<Vec<Income>>;
    async fn delete_income(&self, id: Uuid) -> StorageResult<bool>;

    async fn insert_outcome(&self, outcome: &Outcome) -> StorageResult<()>;
    async fn update_outcome(&self, outcome: &Outcome) -> StorageResult<()>;
    async fn get_outcome(&self, id: Uuid) -> StorageResult<Option<Outcome>>;
    async fn list_outcomes(&self) -> StorageResult<Vec<Outcome>>;
    async fn delete_outcome(&self, id: Uuid) -> StorageResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; usernames are unique.
    async fn insert_user(&self, user: &User) -> StorageResult<()>;
    async fn update_user(&self, user: &User) -> StorageResult<()>;
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
}

/// Unified storage bundle used by the accounting engine.
pub trait AccountingStorage:
    PartnerStore + LegalEntityStore + ApplicationStore + LedgerStore + UserStore + Send + Sync
{
    fn backend_label(&self) -> &'static str;
}

impl AccountingStorage for MemoryStorage {
    fn backend_label(&self) -> &'static str {
        "memory"
    }
}

impl AccountingStorage for PostgresStorage {
    fn backend_label(&self) -> &'static str {
        "postgres"
    }
}
