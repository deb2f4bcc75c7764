use crate::settlement::SettlementFigures;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MISSING_CUSTOMER_LABEL: &str = "Нет заказчика";
pub const MISSING_EXECUTOR_LABEL: &str = "Нет исполнителя";
pub const MISSING_GIVING_SIDE_LABEL: &str = "Нет отдающей стороны";
pub const MISSING_LEGAL_ENTITY_LABEL: &str = "Нет юр. лица";

/// Which side of an application a partner can take.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PartnerRole {
    Customer,
    Executor,
}

impl PartnerRole {
    pub fn from_executor_flag(is_executor: bool) -> Self {
        if is_executor {
            Self::Executor
        } else {
            Self::Customer
        }
    }

    pub fn is_executor(self) -> bool {
        matches!(self, Self::Executor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Executor => "executor",
        }
    }
}

impl fmt::Display for PartnerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartnerRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "executor" => Ok(Self::Executor),
            other => Err(format!(
                "invalid role '{other}'; expected executor or customer"
            )),
        }
    }
}

/// A counterparty, either a customer or an executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub referral_percentage: Decimal,
    pub role: PartnerRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Submitted partner fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerDraft {
    pub name: String,
    #[serde(default)]
    pub referral_percentage: Decimal,
    pub role: PartnerRole,
}

/// Billing entity owned by a partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalEntity {
    pub id: Uuid,
    pub name: String,
    pub partner_id: Uuid,
    pub tax_number: String,
    pub legal_entity_percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEntityDraft {
    pub name: String,
    pub partner_id: Uuid,
    pub tax_number: String,
    #[serde(default)]
    pub legal_entity_percentage: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Awaiting,
    PartialShipment,
    Ready,
}

impl ApplicationStatus {
    pub const ALL: [Self; 3] = [Self::Awaiting, Self::PartialShipment, Self::Ready];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Awaiting => "awaiting",
            Self::PartialShipment => "partial_shipment",
            Self::Ready => "ready",
        }
    }

    /// Label shown to operators.
    pub fn label(self) -> &'static str {
        match self {
            Self::Awaiting => "Ожидает",
            Self::PartialShipment => "Частичная отгрузка",
            Self::Ready => "Готова",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value || status.label() == value)
            .ok_or_else(|| {
                format!("invalid status '{value}'; expected awaiting, partial_shipment or ready")
            })
    }
}

/// Transaction record between a customer and an executor.
///
/// Partner and legal-entity references are nullable: deleting a referenced
/// record keeps the application and clears the reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub status: ApplicationStatus,
    pub customer_id: Option<Uuid>,
    pub executor_id: Option<Uuid>,
    pub giving_side_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub initial_sum: Decimal,
    pub executor_commission: Decimal,
    pub commission_with_interest: Decimal,
    pub comment: String,
    pub is_documents: bool,
    #[serde(flatten)]
    pub figures: SettlementFigures,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn references_partner(&self, partner_id: Uuid) -> bool {
        [self.customer_id, self.executor_id, self.giving_side_id].contains(&Some(partner_id))
    }
}

/// Submitted application fields. Derived sums are never accepted from input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDraft {
    #[serde(default)]
    pub status: ApplicationStatus,
    pub customer_id: Option<Uuid>,
    pub executor_id: Option<Uuid>,
    pub giving_side_id: Option<Uuid>,
    pub receiver_id: Option<Uuid>,
    pub sender_id: Option<Uuid>,
    pub initial_sum: Decimal,
    #[serde(default)]
    pub executor_commission: Decimal,
    #[serde(default)]
    pub commission_with_interest: Decimal,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub is_documents: bool,
}

/// Amount credited to an executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: Uuid,
    pub executor_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeDraft {
    pub executor_id: Uuid,
    pub amount: Decimal,
}

/// Amount debited from a customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDraft {
    pub customer_id: Uuid,
    pub amount: Decimal,
}

/// Operator account. Secrets never leave the process in serialized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub otp_secret: String,
    pub created_at: DateTime<Utc>,
}
