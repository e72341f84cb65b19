use crate::aggregate::{monthly_total, one_time_total, overflow};
use crate::error::AppError;
use crate::models::{CostCategory, ForecastPeriod};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;

/// Longest forecast accepted, one hundred years of months.
pub const MAX_PERIODS: u32 = 1200;

/// Calendar (year, month) that is `offset` months after `start`.
fn shift_month(start: NaiveDate, offset: u32) -> (i32, u32) {
    let zero_based = start.year() * 12 + start.month0() as i32 + offset as i32;
    (zero_based.div_euclid(12), zero_based.rem_euclid(12) as u32 + 1)
}

fn period_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{year:04}-{month:02}"))
}

/// Monthly periods starting at the calendar month of `start`.
///
/// One-time costs land entirely in the first period; every period carries
/// the same recurring total.
pub fn generate_forecast(
    categories: &[CostCategory],
    period_count: u32,
    start: NaiveDate,
) -> Result<Vec<ForecastPeriod>, AppError> {
    if period_count == 0 {
        return Err(AppError::Validation(
            "Forecast period count must be at least 1.".into(),
        ));
    }
    if period_count > MAX_PERIODS {
        return Err(AppError::Validation(format!(
            "Forecast period count must be at most {MAX_PERIODS}, got {period_count}."
        )));
    }

    let one_time = one_time_total(categories)?;
    let recurring = monthly_total(categories)?;
    let first_total = one_time.checked_add(recurring).ok_or_else(overflow)?;
    tracing::debug!(periods = period_count, %one_time, %recurring, "generating forecast");

    let periods = (0..period_count)
        .map(|index| {
            let (year, month) = shift_month(start, index);
            let (one_time_cost, total) = if index == 0 {
                (one_time, first_total)
            } else {
                (Decimal::ZERO, recurring)
            };
            ForecastPeriod {
                index,
                year,
                month,
                label: period_label(year, month),
                one_time_cost,
                recurring_cost: recurring,
                total,
            }
        })
        .collect();
    Ok(periods)
}

pub fn generate_forecast_from_today(
    categories: &[CostCategory],
    period_count: u32,
) -> Result<Vec<ForecastPeriod>, AppError> {
    generate_forecast(categories, period_count, Local::now().date_naive())
}
