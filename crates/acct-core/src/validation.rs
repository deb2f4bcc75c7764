//! Pre-save validation.
//!
//! Checks collect every failing field before aborting so a rejected form can
//! show all problems at once. Nothing is written when any check fails.

use crate::error::AcctError;
use crate::types::{
    ApplicationDraft, IncomeDraft, LegalEntity, LegalEntityDraft, OutcomeDraft, Partner,
    PartnerDraft, PartnerRole,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const MAX_NAME_LEN: usize = 255;

/// Field name to error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), AcctError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AcctError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; ")))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}

/// Partners and legal entities resolved from an application draft's ids.
///
/// The engine looks these up after the parent selections are known, so the
/// checks below see the final combination rather than the raw form ids.
#[derive(Debug, Clone, Default)]
pub struct ApplicationSelection {
    pub customer: Option<Partner>,
    pub executor: Option<Partner>,
    pub giving_side: Option<Partner>,
    pub receiver: Option<LegalEntity>,
    pub sender: Option<LegalEntity>,
}

pub fn validate_partner(draft: &PartnerDraft) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, "name", &draft.name);
    check_percentage(&mut errors, "referral_percentage", draft.referral_percentage);
    errors.into_result()
}

pub fn validate_legal_entity(
    draft: &LegalEntityDraft,
    owner: Option<&Partner>,
) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();
    check_name(&mut errors, "name", &draft.name);
    if draft.tax_number.trim().is_empty() {
        errors.add("tax_number", "This field is required.");
    }
    check_percentage(
        &mut errors,
        "legal_entity_percentage",
        draft.legal_entity_percentage,
    );
    if owner.is_none() {
        errors.add("partner_id", "Selected partner does not exist.");
    }
    errors.into_result()
}

pub fn validate_income(draft: &IncomeDraft, executor: Option<&Partner>) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();
    check_role(&mut errors, "executor_id", executor, PartnerRole::Executor);
    check_non_negative(&mut errors, "amount", draft.amount);
    errors.into_result()
}

pub fn validate_outcome(draft: &OutcomeDraft, customer: Option<&Partner>) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();
    check_role(&mut errors, "customer_id", customer, PartnerRole::Customer);
    check_non_negative(&mut errors, "amount", draft.amount);
    errors.into_result()
}

/// Role, ownership and range checks for an application.
///
/// `sender` must belong to the customer and `receiver` to the executor.
pub fn validate_application(
    draft: &ApplicationDraft,
    selection: &ApplicationSelection,
) -> Result<(), AcctError> {
    let mut errors = FieldErrors::new();

    check_selected_role(
        &mut errors,
        "customer_id",
        draft.customer_id.is_some(),
        selection.customer.as_ref(),
        PartnerRole::Customer,
    );
    check_selected_role(
        &mut errors,
        "executor_id",
        draft.executor_id.is_some(),
        selection.executor.as_ref(),
        PartnerRole::Executor,
    );
    check_selected_role(
        &mut errors,
        "giving_side_id",
        draft.giving_side_id.is_some(),
        selection.giving_side.as_ref(),
        PartnerRole::Executor,
    );

    check_owned_entity(
        &mut errors,
        "sender_id",
        draft.sender_id.is_some(),
        selection.sender.as_ref(),
        selection.customer.as_ref(),
    );
    check_owned_entity(
        &mut errors,
        "receiver_id",
        draft.receiver_id.is_some(),
        selection.receiver.as_ref(),
        selection.executor.as_ref(),
    );

    check_non_negative(&mut errors, "initial_sum", draft.initial_sum);
    check_percentage(&mut errors, "executor_commission", draft.executor_commission);
    check_percentage(
        &mut errors,
        "commission_with_interest",
        draft.commission_with_interest,
    );

    errors.into_result()
}

fn check_name(errors: &mut FieldErrors, field: &str, name: &str) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.add(field, "This field is required.");
    } else if trimmed.chars().count() > MAX_NAME_LEN {
        errors.add(
            field,
            format!("Ensure this value has at most {MAX_NAME_LEN} characters."),
        );
    }
}

fn check_percentage(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        errors.add(field, "Percentage must be between 0 and 100.");
    }
}

fn check_non_negative(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.add(field, "Amount must not be negative.");
    }
}

fn check_role(
    errors: &mut FieldErrors,
    field: &str,
    partner: Option<&Partner>,
    expected: PartnerRole,
) {
    match partner {
        None => errors.add(field, "Selected partner does not exist."),
        Some(partner) if partner.role != expected => errors.add(
            field,
            format!("Partner '{}' is not a {expected}.", partner.name),
        ),
        Some(_) => {}
    }
}

fn check_selected_role(
    errors: &mut FieldErrors,
    field: &str,
    selected: bool,
    partner: Option<&Partner>,
    expected: PartnerRole,
) {
    if !selected {
        errors.add(field, "This field is required.");
        return;
    }
    check_role(errors, field, partner, expected);
}

fn check_owned_entity(
    errors: &mut FieldErrors,
    field: &str,
    selected: bool,
    entity: Option<&LegalEntity>,
    owner: Option<&Partner>,
) {
    if !selected {
        errors.add(field, "This field is required.");
        return;
    }
    let Some(entity) = entity else {
        errors.add(field, "Selected legal entity does not exist.");
        return;
    };
    // Owner errors are reported on the partner field already.
    if let Some(owner) = owner {
        if entity.partner_id != owner.id {
            errors.add(
                field,
                format!(
                    "Legal entity '{}' does not belong to partner '{}'.",
                    entity.name, owner.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn partner(name: &str, role: PartnerRole) -> Partner {
        Partner {
            id: Uuid::new_v4(),
            name: name.to_string(),
            referral_percentage: Decimal::new(5, 0),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn entity(name: &str, owner: &Partner) -> LegalEntity {
        LegalEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            partner_id: owner.id,
            tax_number: "7707083893".to_string(),
            legal_entity_percentage: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn consistent() -> (ApplicationDraft, ApplicationSelection) {
        let customer = partner("Romashka", PartnerRole::Customer);
        let executor = partner("Vector", PartnerRole::Executor);
        let giving_side = partner("Orbita", PartnerRole::Executor);
        let sender = entity("Romashka LLC", &customer);
        let receiver = entity("Vector LLC", &executor);

        let draft = ApplicationDraft {
            status: Default::default(),
            customer_id: Some(customer.id),
            executor_id: Some(executor.id),
            giving_side_id: Some(giving_side.id),
            receiver_id: Some(receiver.id),
            sender_id: Some(sender.id),
            initial_sum: Decimal::new(10_000, 0),
            executor_commission: Decimal::new(20, 0),
            commission_with_interest: Decimal::new(10, 0),
            comment: String::new(),
            is_documents: false,
        };
        let selection = ApplicationSelection {
            customer: Some(customer),
            executor: Some(executor),
            giving_side: Some(giving_side),
            receiver: Some(receiver),
            sender: Some(sender),
        };
        (draft, selection)
    }

    fn field_errors(result: Result<(), AcctError>) -> FieldErrors {
        match result {
            Err(AcctError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn consistent_selection_passes() {
        let (draft, selection) = consistent();
        assert!(validate_application(&draft, &selection).is_ok());
    }

    #[test]
    fn executor_in_customer_field_is_rejected() {
        let (mut draft, mut selection) = consistent();
        let wrong = partner("Vector-2", PartnerRole::Executor);
        draft.customer_id = Some(wrong.id);
        selection.customer = Some(wrong);

        let errors = field_errors(validate_application(&draft, &selection));
        assert!(errors.contains("customer_id"));
    }

    #[test]
    fn customer_in_executor_or_giving_side_is_rejected() {
        let (mut draft, mut selection) = consistent();
        let wrong = partner("Romashka-2", PartnerRole::Customer);
        draft.giving_side_id = Some(wrong.id);
        selection.giving_side = Some(wrong.clone());
        draft.executor_id = Some(wrong.id);
        selection.executor = Some(wrong);

        let errors = field_errors(validate_application(&draft, &selection));
        assert!(errors.contains("executor_id"));
        assert!(errors.contains("giving_side_id"));
    }

    #[test]
    fn legal_entity_of_another_partner_is_rejected() {
        let (draft, mut selection) = consistent();
        let stranger = partner("Stranger", PartnerRole::Customer);
        selection.sender = Some(entity("Stranger LLC", &stranger));

        let errors = field_errors(validate_application(&draft, &selection));
        assert!(errors.contains("sender_id"));
        assert!(!errors.contains("receiver_id"));
    }

    #[test]
    fn missing_references_and_bad_ranges_are_all_reported() {
        let (mut draft, mut selection) = consistent();
        draft.receiver_id = None;
        selection.receiver = None;
        draft.initial_sum = Decimal::new(-1, 0);
        draft.executor_commission = Decimal::new(101, 0);

        let errors = field_errors(validate_application(&draft, &selection));
        assert!(errors.contains("receiver_id"));
        assert!(errors.contains("initial_sum"));
        assert!(errors.contains("executor_commission"));
        assert!(!errors.contains("commission_with_interest"));
    }

    #[test]
    fn income_requires_executor_and_outcome_requires_customer() {
        let customer = partner("Romashka", PartnerRole::Customer);
        let executor = partner("Vector", PartnerRole::Executor);

        let income = IncomeDraft {
            executor_id: customer.id,
            amount: Decimal::new(100, 0),
        };
        assert!(field_errors(validate_income(&income, Some(&customer))).contains("executor_id"));

        let outcome = OutcomeDraft {
            customer_id: executor.id,
            amount: Decimal::new(100, 0),
        };
        assert!(field_errors(validate_outcome(&outcome, Some(&executor))).contains("customer_id"));
        assert!(validate_outcome(
            &OutcomeDraft {
                customer_id: customer.id,
                amount: Decimal::ZERO
            },
            Some(&customer)
        )
        .is_ok());
    }

    #[test]
    fn partner_name_and_percentage_are_checked() {
        let errors = field_errors(validate_partner(&PartnerDraft {
            name: "   ".to_string(),
            referral_percentage: Decimal::new(-5, 1),
            role: PartnerRole::Customer,
        }));
        assert_eq!(errors.get("name").map(<[String]>::len), Some(1));
        assert!(errors.contains("referral_percentage"));
    }
}
