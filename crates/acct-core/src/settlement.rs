//! Settlement derivation for applications.
//!
//! Every application save recomputes four dependent sums from the initial
//! sum, the two commission rates, and the giving side's referral percentage.
//! All arithmetic is fixed-point decimal; the three directly derived sums are
//! rounded half-up to cents and clean income is their exact difference.

use crate::error::AcctError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const MONEY_SCALE: u32 = 2;

/// Inputs of the settlement derivation. Rates are percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementInputs {
    pub initial_sum: Decimal,
    pub executor_commission: Decimal,
    pub commission_with_interest: Decimal,
    pub referral_percentage: Decimal,
}

/// Derived application sums, persisted next to their inputs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SettlementFigures {
    pub settlement_sum: Decimal,
    pub uncargo_sum: Decimal,
    pub referral_amount: Decimal,
    pub clean_income: Decimal,
}

/// Derive the four settlement figures.
///
/// Pure: the same inputs always give the same figures, so re-saving an
/// unchanged application leaves its stored sums untouched.
pub fn derive(inputs: &SettlementInputs) -> Result<SettlementFigures, AcctError> {
    let settlement_sum = money(share_after(
        inputs.initial_sum,
        inputs.executor_commission,
        "settlement_sum",
    )?);
    let uncargo_sum = money(share_after(
        inputs.initial_sum,
        inputs.commission_with_interest,
        "uncargo_sum",
    )?);
    let referral_amount = money(
        inputs
            .initial_sum
            .checked_mul(inputs.referral_percentage)
            .and_then(|value| value.checked_div(HUNDRED))
            .ok_or(AcctError::Overflow("referral_amount"))?,
    );

    let clean_income = settlement_sum
        .checked_sub(uncargo_sum)
        .and_then(|value| value.checked_sub(referral_amount))
        .ok_or(AcctError::Overflow("clean_income"))?;

    Ok(SettlementFigures {
        settlement_sum,
        uncargo_sum,
        referral_amount,
        clean_income: money(clean_income),
    })
}

/// `sum * (100 - rate) / 100`
fn share_after(sum: Decimal, rate: Decimal, field: &'static str) -> Result<Decimal, AcctError> {
    HUNDRED
        .checked_sub(rate)
        .and_then(|remainder| sum.checked_mul(remainder))
        .and_then(|value| value.checked_div(HUNDRED))
        .ok_or(AcctError::Overflow(field))
}

/// Round half-up to cents and pin the scale so values render as `0.00`.
pub fn money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
