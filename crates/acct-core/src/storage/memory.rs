//! In-memory storage backend.
//!
//! Deterministic and test-friendly. All tables sit behind one lock so the
//! partner delete cascade is applied atomically.

use super::{
    ApplicationStore, LedgerStore, LegalEntityStore, PartnerStore, StorageError, StorageResult,
    UserStore,
};
use crate::types::{Application, Income, LegalEntity, Outcome, Partner, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    partners: HashMap<Uuid, Partner>,
    legal_entities: HashMap<Uuid, LegalEntity>,
    applications: HashMap<Uuid, Application>,
    incomes: HashMap<Uuid, Income>,
    outcomes: HashMap<Uuid, Outcome>,
    users: HashMap<Uuid, User>,
}

impl Tables {
    fn clear_legal_entity_refs(&mut self, entity_id: Uuid) {
        for application in self.applications.values_mut() {
            if application.receiver_id == Some(entity_id) {
                application.receiver_id = None;
            }
            if application.sender_id == Some(entity_id) {
                application.sender_id = None;
            }
        }
    }

    fn clear_partner_refs(&mut self, partner_id: Uuid) {
        for application in self.applications.values_mut() {
            if application.customer_id == Some(partner_id) {
                application.customer_id = None;
            }
            if application.executor_id == Some(partner_id) {
                application.executor_id = None;
            }
            if application.giving_side_id == Some(partner_id) {
                application.giving_side_id = None;
            }
        }
    }
}

/// In-memory accounting storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::Backend("tables lock poisoned".to_string()))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::Backend("tables lock poisoned".to_string()))
    }
}

fn replace<T>(table: &mut HashMap<Uuid, T>, id: Uuid, value: T, kind: &str) -> StorageResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(StorageError::NotFound(format!("{kind} {id}"))),
    }
}

#[async_trait]
impl PartnerStore for MemoryStorage {
    async fn insert_partner(&self, partner: &Partner) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.partners.values().any(|p| p.name == partner.name) {
            return Err(StorageError::Conflict(format!(
                "partner named '{}' already exists",
                partner.name
            )));
        }
        tables.partners.insert(partner.id, partner.clone());
        Ok(())
    }

    async fn update_partner(&self, partner: &Partner) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables
            .partners
            .values()
            .any(|p| p.name == partner.name && p.id != partner.id)
        {
            return Err(StorageError::Conflict(format!(
                "partner named '{}' already exists",
                partner.name
            )));
        }
        replace(&mut tables.partners, partner.id, partner.clone(), "partner")
    }

    async fn get_partner(&self, id: Uuid) -> StorageResult<Option<Partner>> {
        Ok(self.read()?.partners.get(&id).cloned())
    }

    async fn list_partners(&self) -> StorageResult<Vec<Partner>> {
        Ok(self.read()?.partners.values().cloned().collect())
    }

    async fn delete_partner(&self, id: Uuid) -> StorageResult<bool> {
        let mut tables = self.write()?;
        if tables.partners.remove(&id).is_none() {
            return Ok(false);
        }

        let owned_entities = tables
            .legal_entities
            .values()
            .filter(|entity| entity.partner_id == id)
            .map(|entity| entity.id)
            .collect::<Vec<_>>();
        for entity_id in owned_entities {
            tables.legal_entities.remove(&entity_id);
            tables.clear_legal_entity_refs(entity_id);
        }

        tables.incomes.retain(|_, income| income.executor_id != id);
        tables.outcomes.retain(|_, outcome| outcome.customer_id != id);
        tables.clear_partner_refs(id);
        Ok(true)
    }
}

#[async_trait]
impl LegalEntityStore for MemoryStorage {
    async fn insert_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.legal_entities.values().any(|e| e.name == entity.name) {
            return Err(StorageError::Conflict(format!(
                "legal entity named '{}' already exists",
                entity.name
            )));
        }
        tables.legal_entities.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn update_legal_entity(&self, entity: &LegalEntity) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables
            .legal_entities
            .values()
            .any(|e| e.name == entity.name && e.id != entity.id)
        {
            return Err(StorageError::Conflict(format!(
                "legal entity named '{}' already exists",
                entity.name
            )));
        }
        replace(
            &mut tables.legal_entities,
            entity.id,
            entity.clone(),
            "legal entity",
        )
    }

    async fn get_legal_entity(&self, id: Uuid) -> StorageResult<Option<LegalEntity>> {
        Ok(self.read()?.legal_entities.get(&id).cloned())
    }

    async fn list_legal_entities(&self) -> StorageResult<Vec<LegalEntity>> {
        Ok(self.read()?.legal_entities.values().cloned().collect())
    }

    async fn delete_legal_entity(&self, id: Uuid) -> StorageResult<bool> {
        let mut tables = self.write()?;
        if tables.legal_entities.remove(&id).is_none() {
            return Ok(false);
        }
        tables.clear_legal_entity_refs(id);
        Ok(true)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStorage {
    async fn insert_application(&self, application: &Application) -> StorageResult<()> {
        self.write()?
            .applications
            .insert(application.id, application.clone());
        Ok(())
    }

    async fn update_application(&self, application: &Application) -> StorageResult<()> {
        replace(
            &mut self.write()?.applications,
            application.id,
            application.clone(),
            "application",
        )
    }

    async fn get_application(&self, id: Uuid) -> StorageResult<Option<Application>> {
        Ok(self.read()?.applications.get(&id).cloned())
    }

    async fn list_applications(&self) -> StorageResult<Vec<Application>> {
        Ok(self.read()?.applications.values().cloned().collect())
    }

    async fn delete_application(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.write()?.applications.remove(&id).is_some())
    }
}

#[async_trait]
impl LedgerStore for MemoryStorage {
    async fn insert_income(&self, income: &Income) -> StorageResult<()> {
        self.write()?.incomes.insert(income.id, income.clone());
        Ok(())
    }

    async fn update_income(&self, income: &Income) -> StorageResult<()> {
        replace(&mut self.write()?.incomes, income.id, income.clone(), "income")
    }

    async fn get_income(&self, id: Uuid) -> StorageResult<Option<Income>> {
        Ok(self.read()?.incomes.get(&id).cloned())
    }

    async fn list_incomes(&self) -> StorageResult<Vec<Income>> {
        Ok(self.read()?.incomes.values().cloned().collect())
    }

    async fn delete_income(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.write()?.incomes.remove(&id).is_some())
    }

    async fn insert_outcome(&self, outcome: &Outcome) -> StorageResult<()> {
        self.write()?.outcomes.insert(outcome.id, outcome.clone());
        Ok(())
    }

    async fn update_outcome(&self, outcome: &Outcome) -> StorageResult<()> {
        replace(
            &mut self.write()?.outcomes,
            outcome.id,
            outcome.clone(),
            "outcome",
        )
    }

    async fn get_outcome(&self, id: Uuid) -> StorageResult<Option<Outcome>> {
        Ok(self.read()?.outcomes.get(&id).cloned())
    }

    async fn list_outcomes(&self) -> StorageResult<Vec<Outcome>> {
        Ok(self.read()?.outcomes.values().cloned().collect())
    }

    async fn delete_outcome(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.write()?.outcomes.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn insert_user(&self, user: &User) -> StorageResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StorageError::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        replace(&mut self.write()?.users, user.id, user.clone(), "user")
    }

    async fn get_user(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}
