//! Partner reconciliation: what the ledger recorded against what the
//! applications say the partner should have received or paid.
//!
//! - executor: incomes vs. settlement sums of the applications it executed,
//!   broken down per customer
//! - customer: outcomes vs. initial sums of the applications it ordered,
//!   broken down per executor

use crate::error::AcctError;
use crate::types::{
    Application, Income, Outcome, Partner, PartnerRole, MISSING_CUSTOMER_LABEL,
    MISSING_EXECUTOR_LABEL,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CounterpartyLine {
    pub partner_id: Option<Uuid>,
    pub partner_name: String,
    pub applications: usize,
    pub expected_total: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiscrepancyReport {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub role: PartnerRole,
    /// Sum of incomes (executor) or outcomes (customer) on record.
    pub ledger_total: Decimal,
    /// Sum implied by the partner's applications.
    pub expected_total: Decimal,
    /// `expected_total - ledger_total`
    pub discrepancy: Decimal,
    pub breakdown: Vec<CounterpartyLine>,
}

pub fn reconcile(
    partner: &Partner,
    role: PartnerRole,
    applications: &[Application],
    incomes: &[Income],
    outcomes: &[Outcome],
    partners: &[Partner],
) -> Result<DiscrepancyReport, AcctError> {
    if partner.role != role {
        return Err(AcctError::invalid(
            "role",
            format!("Partner '{}' is not a {role}.", partner.name),
        ));
    }

    let names = partners
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect::<HashMap<_, _>>();

    let (ledger_total, missing_label) = match role {
        PartnerRole::Executor => (
            checked_total(
                incomes
                    .iter()
                    .filter(|income| income.executor_id == partner.id)
                    .map(|income| income.amount),
                "ledger_total",
            )?,
            MISSING_CUSTOMER_LABEL,
        ),
        PartnerRole::Customer => (
            checked_total(
                outcomes
                    .iter()
                    .filter(|outcome| outcome.customer_id == partner.id)
                    .map(|outcome| outcome.amount),
                "ledger_total",
            )?,
            MISSING_EXECUTOR_LABEL,
        ),
    };

    let mut grouped: BTreeMap<Option<Uuid>, (usize, Decimal)> = BTreeMap::new();
    for application in applications {
        // (own side, other side, what the own side is owed or owes)
        let (own, counterparty, expected) = match role {
            PartnerRole::Executor => (
                application.executor_id,
                application.customer_id,
                application.figures.settlement_sum,
            ),
            PartnerRole::Customer => (
                application.customer_id,
                application.executor_id,
                application.initial_sum,
            ),
        };
        if own != Some(partner.id) {
            continue;
        }
        let line = grouped.entry(counterparty).or_insert((0, Decimal::ZERO));
        line.0 += 1;
        line.1 = line
            .1
            .checked_add(expected)
            .ok_or(AcctError::Overflow("expected_total"))?;
    }

    let mut breakdown = grouped
        .into_iter()
        .map(|(partner_id, (count, expected_total))| CounterpartyLine {
            partner_id,
            partner_name: partner_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(missing_label)
                .to_string(),
            applications: count,
            expected_total,
        })
        .collect::<Vec<_>>();
    breakdown.sort_by(|a, b| {
        a.partner_name
            .cmp(&b.partner_name)
            .then_with(|| a.partner_id.cmp(&b.partner_id))
    });

    let expected_total = checked_total(
        breakdown.iter().map(|line| line.expected_total),
        "expected_total",
    )?;
    let discrepancy = expected_total
        .checked_sub(ledger_total)
        .ok_or(AcctError::Overflow("discrepancy"))?;

    Ok(DiscrepancyReport {
        partner_id: partner.id,
        partner_name: partner.name.clone(),
        role,
        ledger_total,
        expected_total,
        discrepancy,
        breakdown,
    })
}

fn checked_total(
    mut amounts: impl Iterator<Item = Decimal>,
    field: &'static str,
) -> Result<Decimal, AcctError> {
    amounts.try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).ok_or(AcctError::Overflow(field))
    })
}
