//! Partner accounting core.
//!
//! This crate owns the domain records (partners, legal entities, applications,
//! incomes, outcomes), the settlement derivation applied on every application
//! save, the validation that guards it, and the storage and two-factor
//! authentication primitives the service layer composes.

#![deny(unsafe_code)]

pub mod auth;
pub mod engine;
pub mod error;
pub mod query;
pub mod reconciliation;
pub mod session;
pub mod settlement;
pub mod storage;
pub mod types;
pub mod validation;

pub use auth::{AuthConfig, Authenticator, Provisioning, Registration};
pub use engine::{AccountingEngine, ApplicationView};
pub use error::AcctError;
pub use query::{ListFilter, Page, SortKey, SortOrder};
pub use reconciliation::{reconcile, CounterpartyLine, DiscrepancyReport};
pub use session::{Session, SessionStage, SessionStore};
pub use settlement::{derive, SettlementFigures, SettlementInputs};
pub use storage::{
    AccountingStorage, ApplicationStore, LedgerStore, LegalEntityStore, MemoryStorage,
    PartnerStore, PostgresStorage, StorageConfig, StorageError, StorageResult, UserStore,
};
pub use types::{
    Application, ApplicationDraft, ApplicationStatus, Income, IncomeDraft, LegalEntity,
    LegalEntityDraft, Outcome, OutcomeDraft, Partner, PartnerDraft, PartnerRole, User,
};
pub use validation::FieldErrors;
