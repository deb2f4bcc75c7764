//! List filtering: filter, then order, then window.

use crate::types::{
    Application, ApplicationStatus, Income, LegalEntity, Outcome, Partner, PartnerRole,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    Amount,
    Name,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Optional list parameters shared by every record family.
///
/// Parameters that make no sense for a family (e.g. `status` for incomes)
/// are ignored for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilter {
    pub partner: Option<Uuid>,
    pub role: Option<PartnerRole>,
    pub status: Option<ApplicationStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// One window of a filtered, ordered collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: usize,
    pub returned: usize,
    pub items: Vec<T>,
}

/// Record attributes the list filter reads.
pub trait Listable {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
    fn involves(&self, partner_id: Uuid) -> bool;

    fn amount(&self) -> Option<Decimal> {
        None
    }

    fn name(&self) -> Option<&str> {
        None
    }

    fn role(&self) -> Option<PartnerRole> {
        None
    }

    fn status(&self) -> Option<ApplicationStatus> {
        None
    }
}

impl ListFilter {
    pub fn for_partner(partner_id: Uuid) -> Self {
        Self {
            partner: Some(partner_id),
            ..Self::default()
        }
    }

    pub fn for_role(role: PartnerRole) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// Every matching record, no windowing.
    pub fn unbounded(mut self) -> Self {
        self.limit = Some(usize::MAX);
        self
    }

    pub fn matches<T: Listable>(&self, item: &T) -> bool {
        if let Some(partner) = self.partner {
            if !item.involves(partner) {
                return false;
            }
        }
        if let (Some(wanted), Some(role)) = (self.role, item.role()) {
            if wanted != role {
                return false;
            }
        }
        if let (Some(wanted), Some(status)) = (self.status, item.status()) {
            if wanted != status {
                return false;
            }
        }
        if self.from.is_some_and(|from| item.created_at() < from) {
            return false;
        }
        if self.to.is_some_and(|to| item.created_at() > to) {
            return false;
        }
        if let Some(amount) = item.amount() {
            if self.min_amount.is_some_and(|min| amount < min) {
                return false;
            }
            if self.max_amount.is_some_and(|max| amount > max) {
                return false;
            }
        }
        true
    }

    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Page<T> {
        let mut matched = items
            .into_iter()
            .filter(|item| self.matches(item))
            .collect::<Vec<_>>();

        let key = self.sort.unwrap_or_default();
        matched.sort_by(|a, b| compare(key, a, b));
        if self.order.unwrap_or_default() == SortOrder::Desc {
            matched.reverse();
        }

        let total = matched.len();
        let offset = self.offset.unwrap_or(0);
        let limit = match self.limit {
            Some(usize::MAX) => usize::MAX,
            Some(limit) => limit.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect::<Vec<_>>();

        Page {
            total,
            returned: items.len(),
            items,
        }
    }
}

fn compare<T: Listable>(key: SortKey, a: &T, b: &T) -> Ordering {
    let primary = match key {
        SortKey::CreatedAt => Ordering::Equal,
        SortKey::Amount => a.amount().cmp(&b.amount()),
        SortKey::Name => a.name().cmp(&b.name()),
    };
    primary
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.id().cmp(&b.id()))
}

impl Listable for Partner {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn involves(&self, partner_id: Uuid) -> bool {
        self.id == partner_id
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.referral_percentage)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn role(&self) -> Option<PartnerRole> {
        Some(self.role)
    }
}

impl Listable for LegalEntity {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn involves(&self, partner_id: Uuid) -> bool {
        self.partner_id == partner_id
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.legal_entity_percentage)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

impl Listable for Application {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn involves(&self, partner_id: Uuid) -> bool {
        self.references_partner(partner_id)
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.initial_sum)
    }

    fn status(&self) -> Option<ApplicationStatus> {
        Some(self.status)
    }
}

impl Listable for Income {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn involves(&self, partner_id: Uuid) -> bool {
        self.executor_id == partner_id
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}

impl Listable for Outcome {
    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn involves(&self, partner_id: Uuid) -> bool {
        self.customer_id == partner_id
    }

    fn amount(&self) -> Option<Decimal> {
        Some(self.amount)
    }
}
