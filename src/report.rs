use crate::aggregate::{checked_total, monthly_range, scenario_totals, totals_by_category};
use crate::error::AppError;
use crate::models::{ComparisonRow, CostScenario, Difference, ForecastPeriod, ScenarioTotals};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

pub fn parse_format(input: &str, allowed: &[OutputFormat]) -> Result<OutputFormat, AppError> {
    let format = match input.trim().to_ascii_lowercase().as_str() {
        "text" => Some(OutputFormat::Text),
        "json" => Some(OutputFormat::Json),
        "csv" => Some(OutputFormat::Csv),
        _ => None,
    };
    format.filter(|f| allowed.contains(f)).ok_or_else(|| {
        let names: Vec<_> = allowed.iter().map(|f| f.name()).collect();
        AppError::Config(format!(
            "Unsupported format '{}'. Use {}.",
            input.trim(),
            names.join(", ")
        ))
    })
}

impl OutputFormat {
    fn name(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

pub fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn signed_money(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", money(value))
    } else {
        money(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub active: bool,
    pub currency: String,
    pub totals: ScenarioTotals,
    pub monthly_low: Decimal,
    pub monthly_high: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

pub fn summarize(scenario: &CostScenario, currency: &str) -> Result<ScenarioSummary, AppError> {
    let (monthly_low, monthly_high) = monthly_range(&scenario.categories)?;
    Ok(ScenarioSummary {
        scenario: scenario.name.clone(),
        active: scenario.active,
        currency: currency.to_string(),
        totals: scenario_totals(&scenario.categories)?,
        monthly_low,
        monthly_high,
        by_category: totals_by_category(&scenario.categories)?
            .into_iter()
            .map(|(name, monthly)| CategoryTotal { name, monthly })
            .collect(),
    })
}

pub fn render_summary(summary: &ScenarioSummary, format: OutputFormat) -> Result<String, AppError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(summary)?);
    }

    let cur = &summary.currency;
    let mut out = String::new();
    let marker = if summary.active { " (active)" } else { "" };
    let _ = writeln!(out, "Scenario: {}{marker}", summary.scenario);
    let _ = writeln!(out, "Monthly recurring: {:>14} {cur}", money(summary.totals.monthly));
    let _ = writeln!(out, "One-time:          {:>14} {cur}", money(summary.totals.one_time));
    let _ = writeln!(out, "Yearly:            {:>14} {cur}", money(summary.totals.yearly));
    if summary.monthly_low != summary.monthly_high {
        let _ = writeln!(
            out,
            "Monthly range:     {} - {} {cur}",
            money(summary.monthly_low),
            money(summary.monthly_high)
        );
    }
    if !summary.by_category.is_empty() {
        let _ = writeln!(out, "By category (monthly):");
        let width = summary
            .by_category
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0);
        for c in &summary.by_category {
            let _ = writeln!(out, "  {:<width$}  {:>14}", c.name, money(c.monthly));
        }
    }
    Ok(out)
}

pub fn render_forecast(
    periods: &[ForecastPeriod],
    format: OutputFormat,
    currency: &str,
) -> Result<String, AppError> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => return Ok(serde_json::to_string_pretty(periods)?),
        OutputFormat::Csv => {
            let _ = writeln!(out, "index,label,one_time_cost,recurring_cost,total");
            for p in periods {
                let _ = writeln!(
                    out,
                    "{},{},{},{},{}",
                    p.index,
                    csv_field(&p.label),
                    p.one_time_cost,
                    p.recurring_cost,
                    p.total
                );
            }
        }
        OutputFormat::Text => {
            let _ = writeln!(
                out,
                "{:<10} {:>14} {:>14} {:>14}",
                "Period", "One-time", "Recurring", "Total"
            );
            for p in periods {
                let _ = writeln!(
                    out,
                    "{:<10} {:>14} {:>14} {:>14}",
                    p.label,
                    money(p.one_time_cost),
                    money(p.recurring_cost),
                    money(p.total)
                );
            }
            let sum = checked_total(periods.iter().map(|p| p.total))?;
            let _ = writeln!(out, "Total over {} months: {} {currency}", periods.len(), money(sum));
        }
    }
    Ok(out)
}

fn percent_text(difference: &Difference) -> String {
    match difference {
        Difference::Baseline => "baseline".into(),
        Difference::Delta {
            percent: Some(p), ..
        } => format!("{}%", signed_money(*p)),
        Difference::Delta { percent: None, .. } => "n/a".into(),
    }
}

pub fn render_comparison(
    rows: &[ComparisonRow],
    format: OutputFormat,
    currency: &str,
) -> Result<String, AppError> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => return Ok(serde_json::to_string_pretty(rows)?),
        OutputFormat::Csv => {
            let _ = writeln!(out, "scenario,monthly,one_time,yearly,difference,percent");
            for r in rows {
                let (difference, percent) = match r.difference {
                    Difference::Baseline => ("baseline".to_string(), String::new()),
                    Difference::Delta { amount, percent } => (
                        amount.to_string(),
                        percent.map(|p| p.to_string()).unwrap_or_else(|| "n/a".into()),
                    ),
                };
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{}",
                    csv_field(&r.scenario),
                    r.totals.monthly,
                    r.totals.one_time,
                    r.totals.yearly,
                    difference,
                    percent
                );
            }
        }
        OutputFormat::Text => {
            let width = rows
                .iter()
                .map(|r| r.scenario.chars().count())
                .max()
                .unwrap_or(0)
                .max("Scenario".len());
            let _ = writeln!(
                out,
                "{:<width$}  {:>14} {:>14} {:>14} {:>14} {:>10}",
                "Scenario", "Monthly", "One-time", "Yearly", "Difference", "Change"
            );
            for r in rows {
                let difference = match r.difference {
                    Difference::Baseline => "-".to_string(),
                    Difference::Delta { amount, .. } => signed_money(amount),
                };
                let _ = writeln!(
                    out,
                    "{:<width$}  {:>14} {:>14} {:>14} {:>14} {:>10}",
                    r.scenario,
                    money(r.totals.monthly),
                    money(r.totals.one_time),
                    money(r.totals.yearly),
                    difference,
                    percent_text(&r.difference)
                );
            }
            let _ = writeln!(out, "Amounts in {currency} per year.");
        }
    }
    Ok(out)
}
