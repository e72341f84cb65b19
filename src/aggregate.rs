use crate::error::AppError;
use crate::models::{CostCategory, CostItem, ScenarioTotals};
use crate::normalize::{monthly_range as item_range, normalize_to_monthly};
use rust_decimal::Decimal;

fn items(categories: &[CostCategory]) -> impl Iterator<Item = &CostItem> {
    categories.iter().flat_map(|c| c.items.iter())
}

pub(crate) fn overflow() -> AppError {
    AppError::Validation("Cost total overflows the supported range.".into())
}

/// Sum that reports overflow instead of panicking.
pub(crate) fn checked_total(values: impl IntoIterator<Item = Decimal>) -> Result<Decimal, AppError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v).ok_or_else(overflow))
}

/// `monthly × 12 + one_time`, checked.
pub(crate) fn annualize(monthly: Decimal, one_time: Decimal) -> Result<Decimal, AppError> {
    monthly
        .checked_mul(Decimal::from(12))
        .and_then(|m| m.checked_add(one_time))
        .ok_or_else(overflow)
}

pub fn monthly_total(categories: &[CostCategory]) -> Result<Decimal, AppError> {
    checked_total(
        items(categories)
            .filter(|i| i.is_recurring())
            .map(normalize_to_monthly),
    )
}

/// Raw `amount × quantity` of one-time items; never normalized.
pub fn one_time_total(categories: &[CostCategory]) -> Result<Decimal, AppError> {
    checked_total(
        items(categories)
            .filter(|i| !i.is_recurring())
            .map(CostItem::extended_amount),
    )
}

pub fn yearly_total(categories: &[CostCategory]) -> Result<Decimal, AppError> {
    annualize(monthly_total(categories)?, one_time_total(categories)?)
}

/// Monthly recurring total per category, in input order. Categories that
/// sum to exactly zero are left out.
pub fn totals_by_category(categories: &[CostCategory]) -> Result<Vec<(String, Decimal)>, AppError> {
    let mut totals = Vec::new();
    for c in categories {
        let value = checked_total(
            c.items
                .iter()
                .filter(|i| i.is_recurring())
                .map(normalize_to_monthly),
        )?;
        if !value.is_zero() {
            totals.push((c.name.clone(), value));
        }
    }
    Ok(totals)
}

pub fn scenario_totals(categories: &[CostCategory]) -> Result<ScenarioTotals, AppError> {
    let monthly = monthly_total(categories)?;
    let one_time = one_time_total(categories)?;
    let totals = ScenarioTotals {
        monthly,
        one_time,
        yearly: annualize(monthly, one_time)?,
    };
    tracing::debug!(
        monthly = %totals.monthly,
        one_time = %totals.one_time,
        yearly = %totals.yearly,
        "computed scenario totals"
    );
    Ok(totals)
}

/// Sum of the per-item uncertainty bands over recurring items.
pub fn monthly_range(categories: &[CostCategory]) -> Result<(Decimal, Decimal), AppError> {
    items(categories)
        .filter(|i| i.is_recurring())
        .map(item_range)
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(lo, hi), (l, h)| -> Result<_, AppError> {
            Ok((
                lo.checked_add(l).ok_or_else(overflow)?,
                hi.checked_add(h).ok_or_else(overflow)?,
            ))
        })
}
