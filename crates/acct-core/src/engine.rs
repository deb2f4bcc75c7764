use crate::error::AcctError;
use crate::query::{ListFilter, Page};
use crate::reconciliation::{reconcile, DiscrepancyReport};
use crate::settlement::{derive, SettlementInputs};
use crate::storage::AccountingStorage;
use crate::types::{
    Application, ApplicationDraft, Income, IncomeDraft, LegalEntity, LegalEntityDraft, Outcome,
    OutcomeDraft, Partner, PartnerDraft, PartnerRole, MISSING_CUSTOMER_LABEL,
    MISSING_EXECUTOR_LABEL, MISSING_GIVING_SIDE_LABEL, MISSING_LEGAL_ENTITY_LABEL,
};
use crate::validation::{
    validate_application, validate_income, validate_legal_entity, validate_outcome,
    validate_partner, ApplicationSelection,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Application with its references resolved to display names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub customer_name: String,
    pub executor_name: String,
    pub giving_side_name: String,
    pub receiver_name: String,
    pub sender_name: String,
}

struct NameIndex {
    partners: HashMap<Uuid, String>,
    legal_entities: HashMap<Uuid, String>,
}

impl NameIndex {
    fn partner(&self, id: Option<Uuid>, missing: &str) -> String {
        id.and_then(|id| self.partners.get(&id).cloned())
            .unwrap_or_else(|| missing.to_string())
    }

    fn legal_entity(&self, id: Option<Uuid>) -> String {
        id.and_then(|id| self.legal_entities.get(&id).cloned())
            .unwrap_or_else(|| MISSING_LEGAL_ENTITY_LABEL.to_string())
    }

    fn view(&self, application: Application) -> ApplicationView {
        ApplicationView {
            customer_name: self.partner(application.customer_id, MISSING_CUSTOMER_LABEL),
            executor_name: self.partner(application.executor_id, MISSING_EXECUTOR_LABEL),
            giving_side_name: self.partner(application.giving_side_id, MISSING_GIVING_SIDE_LABEL),
            receiver_name: self.legal_entity(application.receiver_id),
            sender_name: self.legal_entity(application.sender_id),
            application,
        }
    }
}

/// Entry point for every accounting operation.
///
/// Each mutation follows the same path: resolve referenced records, validate,
/// derive computed fields, persist.
pub struct AccountingEngine {
    store: Arc<dyn AccountingStorage>,
}

impl AccountingEngine {
    pub fn new(store: Arc<dyn AccountingStorage>) -> Self {
        Self { store }
    }

    pub fn backend_label(&self) -> &'static str {
        self.store.backend_label()
    }

    // Partners

    pub async fn create_partner(&self, draft: PartnerDraft) -> Result<Partner, AcctError> {
        validate_partner(&draft)?;
        let now = Utc::now();
        let partner = Partner {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            referral_percentage: draft.referral_percentage,
            role: draft.role,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_partner(&partner).await?;
        info!(partner_id = %partner.id, role = %partner.role, "created partner");
        Ok(partner)
    }

    pub async fn update_partner(
        &self,
        id: Uuid,
        draft: PartnerDraft,
    ) -> Result<Partner, AcctError> {
        validate_partner(&draft)?;
        let mut partner = self.partner(id).await?;
        partner.name = draft.name.trim().to_string();
        partner.referral_percentage = draft.referral_percentage;
        partner.role = draft.role;
        partner.updated_at = Utc::now();
        self.store.update_partner(&partner).await?;
        info!(partner_id = %partner.id, "updated partner");
        Ok(partner)
    }

    pub async fn partner(&self, id: Uuid) -> Result<Partner, AcctError> {
        self.store
            .get_partner(id)
            .await?
            .ok_or_else(|| AcctError::not_found("partner", id))
    }

    pub async fn list_partners(&self, filter: &ListFilter) -> Result<Page<Partner>, AcctError> {
        Ok(filter.apply(self.store.list_partners().await?))
    }

    pub async fn delete_partner(&self, id: Uuid) -> Result<(), AcctError> {
        if !self.store.delete_partner(id).await? {
            return Err(AcctError::not_found("partner", id));
        }
        info!(partner_id = %id, "deleted partner");
        Ok(())
    }

    /// Partners of one role, by name. Feeds role-restricted pickers.
    pub async fn partners_by_role(&self, role: PartnerRole) -> Result<Vec<Partner>, AcctError> {
        let mut partners = self
            .store
            .list_partners()
            .await?
            .into_iter()
            .filter(|partner| partner.role == role)
            .collect::<Vec<_>>();
        partners.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(partners)
    }

    // Legal entities

    pub async fn create_legal_entity(
        &self,
        draft: LegalEntityDraft,
    ) -> Result<LegalEntity, AcctError> {
        let owner = self.store.get_partner(draft.partner_id).await?;
        validate_legal_entity(&draft, owner.as_ref())?;
        let now = Utc::now();
        let entity = LegalEntity {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            partner_id: draft.partner_id,
            tax_number: draft.tax_number.trim().to_string(),
            legal_entity_percentage: draft.legal_entity_percentage,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_legal_entity(&entity).await?;
        info!(
            legal_entity_id = %entity.id,
            partner_id = %entity.partner_id,
            "created legal entity"
        );
        Ok(entity)
    }

    pub async fn update_legal_entity(
        &self,
        id: Uuid,
        draft: LegalEntityDraft,
    ) -> Result<LegalEntity, AcctError> {
        let mut entity = self.legal_entity(id).await?;
        let owner = self.store.get_partner(draft.partner_id).await?;
        validate_legal_entity(&draft, owner.as_ref())?;
        entity.name = draft.name.trim().to_string();
        entity.partner_id = draft.partner_id;
        entity.tax_number = draft.tax_number.trim().to_string();
        entity.legal_entity_percentage = draft.legal_entity_percentage;
        entity.updated_at = Utc::now();
        self.store.update_legal_entity(&entity).await?;
        info!(legal_entity_id = %entity.id, "updated legal entity");
        Ok(entity)
    }

    pub async fn legal_entity(&self, id: Uuid) -> Result<LegalEntity, AcctError> {
        self.store
            .get_legal_entity(id)
            .await?
            .ok_or_else(|| AcctError::not_found("legal entity", id))
    }

    pub async fn list_legal_entities(
        &self,
        filter: &ListFilter,
    ) -> Result<Page<LegalEntity>, AcctError> {
        Ok(filter.apply(self.store.list_legal_entities().await?))
    }

    pub async fn delete_legal_entity(&self, id: Uuid) -> Result<(), AcctError> {
        if !self.store.delete_legal_entity(id).await? {
            return Err(AcctError::not_found("legal entity", id));
        }
        info!(legal_entity_id = %id, "deleted legal entity");
        Ok(())
    }

    /// Legal entities by name, optionally only those of one partner. This is
    /// the dependent selection behind the sender/receiver pickers.
    pub async fn legal_entities(
        &self,
        partner: Option<Uuid>,
    ) -> Result<Vec<LegalEntity>, AcctError> {
        let mut entities = self
            .store
            .list_legal_entities()
            .await?
            .into_iter()
            .filter(|entity| partner.map_or(true, |id| entity.partner_id == id))
            .collect::<Vec<_>>();
        entities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entities)
    }

    // Applications

    pub async fn create_application(
        &self,
        draft: ApplicationDraft,
    ) -> Result<Application, AcctError> {
        let now = Utc::now();
        let application = self.settle(Uuid::new_v4(), draft, now, now).await?;
        self.store.insert_application(&application).await?;
        info!(
            application_id = %application.id,
            initial_sum = %application.initial_sum,
            settlement_sum = %application.figures.settlement_sum,
            "created application"
        );
        Ok(application)
    }

    /// Replace an application's inputs; derived sums are recomputed from
    /// scratch and any stored values are discarded.
    pub async fn update_application(
        &self,
        id: Uuid,
        draft: ApplicationDraft,
    ) -> Result<Application, AcctError> {
        let existing = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(|| AcctError::not_found("application", id))?;
        let application = self
            .settle(id, draft, existing.created_at, Utc::now())
            .await?;
        self.store.update_application(&application).await?;
        info!(
            application_id = %application.id,
            status = application.status.as_str(),
            clean_income = %application.figures.clean_income,
            "updated application"
        );
        Ok(application)
    }

    pub async fn application(&self, id: Uuid) -> Result<ApplicationView, AcctError> {
        let application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(|| AcctError::not_found("application", id))?;
        Ok(self.name_index().await?.view(application))
    }

    pub async fn list_applications(
        &self,
        filter: &ListFilter,
    ) -> Result<Page<ApplicationView>, AcctError> {
        let page = filter.apply(self.store.list_applications().await?);
        let names = self.name_index().await?;
        let items = page
            .items
            .into_iter()
            .map(|application| names.view(application))
            .collect();
        Ok(Page {
            total: page.total,
            returned: page.returned,
            items,
        })
    }

    pub async fn delete_application(&self, id: Uuid) -> Result<(), AcctError> {
        if !self.store.delete_application(id).await? {
            return Err(AcctError::not_found("application", id));
        }
        info!(application_id = %id, "deleted application");
        Ok(())
    }

    async fn settle(
        &self,
        id: Uuid,
        draft: ApplicationDraft,
        created_at: chrono::DateTime<Utc>,
        updated_at: chrono::DateTime<Utc>,
    ) -> Result<Application, AcctError> {
        let selection = self.resolve_selection(&draft).await?;
        validate_application(&draft, &selection)?;

        let referral_percentage = selection
            .giving_side
            .as_ref()
            .map_or(Decimal::ZERO, |partner| partner.referral_percentage);
        let figures = derive(&SettlementInputs {
            initial_sum: draft.initial_sum,
            executor_commission: draft.executor_commission,
            commission_with_interest: draft.commission_with_interest,
            referral_percentage,
        })?;

        Ok(Application {
            id,
            status: draft.status,
            customer_id: draft.customer_id,
            executor_id: draft.executor_id,
            giving_side_id: draft.giving_side_id,
            receiver_id: draft.receiver_id,
            sender_id: draft.sender_id,
            initial_sum: draft.initial_sum,
            executor_commission: draft.executor_commission,
            commission_with_interest: draft.commission_with_interest,
            comment: draft.comment,
            is_documents: draft.is_documents,
            figures,
            created_at,
            updated_at,
        })
    }

    async fn resolve_selection(
        &self,
        draft: &ApplicationDraft,
    ) -> Result<ApplicationSelection, AcctError> {
        Ok(ApplicationSelection {
            customer: self.lookup_partner(draft.customer_id).await?,
            executor: self.lookup_partner(draft.executor_id).await?,
            giving_side: self.lookup_partner(draft.giving_side_id).await?,
            receiver: self.lookup_legal_entity(draft.receiver_id).await?,
            sender: self.lookup_legal_entity(draft.sender_id).await?,
        })
    }

    async fn lookup_partner(&self, id: Option<Uuid>) -> Result<Option<Partner>, AcctError> {
        match id {
            Some(id) => Ok(self.store.get_partner(id).await?),
            None => Ok(None),
        }
    }

    async fn lookup_legal_entity(
        &self,
        id: Option<Uuid>,
    ) -> Result<Option<LegalEntity>, AcctError> {
        match id {
            Some(id) => Ok(self.store.get_legal_entity(id).await?),
            None => Ok(None),
        }
    }

    async fn name_index(&self) -> Result<NameIndex, AcctError> {
        Ok(NameIndex {
            partners: self
                .store
                .list_partners()
                .await?
                .into_iter()
                .map(|partner| (partner.id, partner.name))
                .collect(),
            legal_entities: self
                .store
                .list_legal_entities()
                .await?
                .into_iter()
                .map(|entity| (entity.id, entity.name))
                .collect(),
        })
    }

    // Ledger

    pub async fn create_income(&self, draft: IncomeDraft) -> Result<Income, AcctError> {
        let executor = self.store.get_partner(draft.executor_id).await?;
        validate_income(&draft, executor.as_ref())?;
        let now = Utc::now();
        let income = Income {
            id: Uuid::new_v4(),
            executor_id: draft.executor_id,
            amount: draft.amount,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_income(&income).await?;
        info!(
            income_id = %income.id,
            executor_id = %income.executor_id,
            amount = %income.amount,
            "recorded income"
        );
        Ok(income)
    }

    pub async fn update_income(&self, id: Uuid, draft: IncomeDraft) -> Result<Income, AcctError> {
        let mut income = self.income(id).await?;
        let executor = self.store.get_partner(draft.executor_id).await?;
        validate_income(&draft, executor.as_ref())?;
        income.executor_id = draft.executor_id;
        income.amount = draft.amount;
        income.updated_at = Utc::now();
        self.store.update_income(&income).await?;
        info!(income_id = %income.id, "updated income");
        Ok(income)
    }

    pub async fn income(&self, id: Uuid) -> Result<Income, AcctError> {
        self.store
            .get_income(id)
            .await?
            .ok_or_else(|| AcctError::not_found("income", id))
    }

    pub async fn list_incomes(&self, filter: &ListFilter) -> Result<Page<Income>, AcctError> {
        Ok(filter.apply(self.store.list_incomes().await?))
    }

    pub async fn delete_income(&self, id: Uuid) -> Result<(), AcctError> {
        if !self.store.delete_income(id).await? {
            return Err(AcctError::not_found("income", id));
        }
        info!(income_id = %id, "deleted income");
        Ok(())
    }

    pub async fn create_outcome(&self, draft: OutcomeDraft) -> Result<Outcome, AcctError> {
        let customer = self.store.get_partner(draft.customer_id).await?;
        validate_outcome(&draft, customer.as_ref())?;
        let now = Utc::now();
        let outcome = Outcome {
            id: Uuid::new_v4(),
            customer_id: draft.customer_id,
            amount: draft.amount,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_outcome(&outcome).await?;
        info!(
            outcome_id = %outcome.id,
            customer_id = %outcome.customer_id,
            amount = %outcome.amount,
            "recorded outcome"
        );
        Ok(outcome)
    }

    pub async fn update_outcome(
        &self,
        id: Uuid,
        draft: OutcomeDraft,
    ) -> Result<Outcome, AcctError> {
        let mut outcome = self.outcome(id).await?;
        let customer = self.store.get_partner(draft.customer_id).await?;
        validate_outcome(&draft, customer.as_ref())?;
        outcome.customer_id = draft.customer_id;
        outcome.amount = draft.amount;
        outcome.updated_at = Utc::now();
        self.store.update_outcome(&outcome).await?;
        info!(outcome_id = %outcome.id, "updated outcome");
        Ok(outcome)
    }

    pub async fn outcome(&self, id: Uuid) -> Result<Outcome, AcctError> {
        self.store
            .get_outcome(id)
            .await?
            .ok_or_else(|| AcctError::not_found("outcome", id))
    }

    pub async fn list_outcomes(&self, filter: &ListFilter) -> Result<Page<Outcome>, AcctError> {
        Ok(filter.apply(self.store.list_outcomes().await?))
    }

    pub async fn delete_outcome(&self, id: Uuid) -> Result<(), AcctError> {
        if !self.store.delete_outcome(id).await? {
            return Err(AcctError::not_found("outcome", id));
        }
        info!(outcome_id = %id, "deleted outcome");
        Ok(())
    }

    // Reconciliation

    pub async fn discrepancy(
        &self,
        partner_id: Uuid,
        role: PartnerRole,
    ) -> Result<DiscrepancyReport, AcctError> {
        let partner = self.partner(partner_id).await?;
        let applications = self.store.list_applications().await?;
        let incomes = self.store.list_incomes().await?;
        let outcomes = self.store.list_outcomes().await?;
        let partners = self.store.list_partners().await?;
        reconcile(&partner, role, &applications, &incomes, &outcomes, &partners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::ApplicationStatus;

    fn engine() -> AccountingEngine {
        AccountingEngine::new(Arc::new(MemoryStorage::new()))
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str_exact(value).unwrap()
    }

    async fn partner(
        engine: &AccountingEngine,
        name: &str,
        role: PartnerRole,
        referral: &str,
    ) -> Partner {
        engine
            .create_partner(PartnerDraft {
                name: name.to_string(),
                referral_percentage: dec(referral),
                role,
            })
            .await
            .unwrap()
    }

    async fn entity(engine: &AccountingEngine, name: &str, owner: &Partner) -> LegalEntity {
        engine
            .create_legal_entity(LegalEntityDraft {
                name: name.to_string(),
                partner_id: owner.id,
                tax_number: "7707083893".to_string(),
                legal_entity_percentage: Decimal::ZERO,
            })
            .await
            .unwrap()
    }

    struct Fixture {
        customer: Partner,
        executor: Partner,
        giving_side: Partner,
        sender: LegalEntity,
        receiver: LegalEntity,
    }

    async fn fixture(engine: &AccountingEngine) -> Fixture {
        let customer = partner(engine, "Romashka", PartnerRole::Customer, "0").await;
        let executor = partner(engine, "Vector", PartnerRole::Executor, "0").await;
        let giving_side = partner(engine, "Orbita", PartnerRole::Executor, "5").await;
        let sender = entity(engine, "Romashka LLC", &customer).await;
        let receiver = entity(engine, "Vector LLC", &executor).await;
        Fixture {
            customer,
            executor,
            giving_side,
            sender,
            receiver,
        }
    }

    fn draft(fixture: &Fixture, initial_sum: &str) -> ApplicationDraft {
        ApplicationDraft {
            status: ApplicationStatus::Awaiting,
            customer_id: Some(fixture.customer.id),
            executor_id: Some(fixture.executor.id),
            giving_side_id: Some(fixture.giving_side.id),
            receiver_id: Some(fixture.receiver.id),
            sender_id: Some(fixture.sender.id),
            initial_sum: dec(initial_sum),
            executor_commission: dec("20"),
            commission_with_interest: dec("10"),
            comment: String::new(),
            is_documents: false,
        }
    }

    #[tokio::test]
    async fn application_save_derives_settlement_figures() {
        let engine = engine();
        let fixture = fixture(&engine).await;

        let application = engine
            .create_application(draft(&fixture, "10000"))
            .await
            .unwrap();

        assert_eq!(application.figures.settlement_sum, dec("8000.00"));
        assert_eq!(application.figures.uncargo_sum, dec("9000.00"));
        assert_eq!(application.figures.referral_amount, dec("500.00"));
        assert_eq!(application.figures.clean_income, dec("-1500.00"));
    }

    #[tokio::test]
    async fn update_recomputes_and_keeps_creation_time() {
        let engine = engine();
        let fixture = fixture(&engine).await;
        let created = engine
            .create_application(draft(&fixture, "10000"))
            .await
            .unwrap();

        let mut changed = draft(&fixture, "2000");
        changed.status = ApplicationStatus::Ready;
        let updated = engine
            .update_application(created.id, changed)
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.status, ApplicationStatus::Ready);
        assert_eq!(updated.figures.settlement_sum, dec("1600.00"));
        assert_eq!(updated.figures.referral_amount, dec("100.00"));

        let stored = engine.application(created.id).await.unwrap();
        assert_eq!(stored.application, updated);
    }

    #[tokio::test]
    async fn misassigned_roles_write_nothing() {
        let engine = engine();
        let fixture = fixture(&engine).await;

        let mut wrong = draft(&fixture, "100");
        wrong.customer_id = Some(fixture.executor.id);
        let result = engine.create_application(wrong).await;
        assert!(matches!(
            result,
            Err(AcctError::Validation(errors)) if errors.contains("customer_id")
        ));

        let page = engine
            .list_applications(&ListFilter::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn deleting_partner_clears_application_references() {
        let engine = engine();
        let fixture = fixture(&engine).await;
        let application = engine
            .create_application(draft(&fixture, "500"))
            .await
            .unwrap();
        engine
            .create_outcome(OutcomeDraft {
                customer_id: fixture.customer.id,
                amount: dec("10"),
            })
            .await
            .unwrap();

        engine.delete_partner(fixture.customer.id).await.unwrap();

        let view = engine.application(application.id).await.unwrap();
        assert_eq!(view.application.customer_id, None);
        assert_eq!(view.application.sender_id, None);
        assert_eq!(view.customer_name, MISSING_CUSTOMER_LABEL);
        assert_eq!(view.sender_name, MISSING_LEGAL_ENTITY_LABEL);
        assert_eq!(view.executor_name, "Vector");

        let outcomes = engine.list_outcomes(&ListFilter::default()).await.unwrap();
        assert_eq!(outcomes.total, 0);
        assert!(matches!(
            engine.delete_partner(fixture.customer.id).await,
            Err(AcctError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_partner_name_conflicts() {
        let engine = engine();
        partner(&engine, "Romashka", PartnerRole::Customer, "0").await;
        let duplicate = engine
            .create_partner(PartnerDraft {
                name: "Romashka".to_string(),
                referral_percentage: Decimal::ZERO,
                role: PartnerRole::Executor,
            })
            .await;
        assert!(matches!(duplicate, Err(AcctError::Conflict(_))));
    }

    #[tokio::test]
    async fn ledger_entries_check_partner_role() {
        let engine = engine();
        let fixture = fixture(&engine).await;

        let income = engine
            .create_income(IncomeDraft {
                executor_id: fixture.customer.id,
                amount: dec("10"),
            })
            .await;
        assert!(matches!(
            income,
            Err(AcctError::Validation(errors)) if errors.contains("executor_id")
        ));

        let income = engine
            .create_income(IncomeDraft {
                executor_id: fixture.executor.id,
                amount: dec("10"),
            })
            .await
            .unwrap();
        let updated = engine
            .update_income(
                income.id,
                IncomeDraft {
                    executor_id: fixture.executor.id,
                    amount: dec("25"),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, dec("25"));
        assert_eq!(updated.created_at, income.created_at);
    }

    #[tokio::test]
    async fn dependent_selections_filter_by_partner_and_role() {
        let engine = engine();
        let fixture = fixture(&engine).await;

        let entities = engine
            .legal_entities(Some(fixture.executor.id))
            .await
            .unwrap();
        assert_eq!(entities, vec![fixture.receiver.clone()]);
        assert_eq!(engine.legal_entities(None).await.unwrap().len(), 2);

        let executors = engine
            .partners_by_role(PartnerRole::Executor)
            .await
            .unwrap()
            .into_iter()
            .map(|partner| partner.name)
            .collect::<Vec<_>>();
        assert_eq!(executors, vec!["Orbita", "Vector"]);
    }

    #[tokio::test]
    async fn discrepancy_compares_incomes_with_settlements() {
        let engine = engine();
        let fixture = fixture(&engine).await;
        engine
            .create_application(draft(&fixture, "10000"))
            .await
            .unwrap();
        engine
            .create_income(IncomeDraft {
                executor_id: fixture.executor.id,
                amount: dec("7500.00"),
            })
            .await
            .unwrap();

        let report = engine
            .discrepancy(fixture.executor.id, PartnerRole::Executor)
            .await
            .unwrap();
        assert_eq!(report.expected_total, dec("8000.00"));
        assert_eq!(report.discrepancy, dec("500.00"));
        assert_eq!(report.breakdown[0].partner_name, "Romashka");
    }
}
