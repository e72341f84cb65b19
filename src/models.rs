use crate::error::AppError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum Frequency {
    OneTime,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Frequency::OneTime,
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Quarterly,
        Frequency::Yearly,
    ];

    pub fn as_tag(self) -> &'static str {
        match self {
            Frequency::OneTime => "one-time",
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    pub fn is_recurring(self) -> bool {
        !matches!(self, Frequency::OneTime)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase().replace('_', "-");
        Frequency::ALL
            .into_iter()
            .find(|f| f.as_tag() == tag)
            .ok_or_else(|| AppError::Validation(format!("Unknown frequency '{}'.", s.trim())))
    }
}

/// Stored scenarios may carry tags this build does not know. Those are read
/// as already-monthly amounts instead of failing the whole load.
impl From<String> for Frequency {
    fn from(tag: String) -> Self {
        tag.parse().unwrap_or_else(|_| {
            tracing::warn!(frequency = %tag, "unrecognized frequency, treating amount as monthly");
            Frequency::Monthly
        })
    }
}

/// Upper bound on `amount × quantity` for a single item. Keeps the largest
/// monthly equivalent (hourly, ×160) far below `Decimal::MAX`.
pub const MAX_EXTENDED_AMOUNT: u64 = 1_000_000_000_000_000;

/// A single billable line. Only constructible through validation, so
/// `amount >= 0`, `quantity >= 1`, `amount × quantity <= MAX_EXTENDED_AMOUNT`
/// and `variability` in `[0, 1]` always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CostItemRecord")]
pub struct CostItem {
    name: String,
    amount: Decimal,
    frequency: Frequency,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    variability: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CostItemRecord {
    name: String,
    amount: Decimal,
    frequency: Frequency,
    #[serde(default = "default_quantity")]
    quantity: u32,
    #[serde(default)]
    variability: Option<Decimal>,
}

fn default_quantity() -> u32 {
    1
}

impl TryFrom<CostItemRecord> for CostItem {
    type Error = AppError;

    fn try_from(raw: CostItemRecord) -> Result<Self, Self::Error> {
        let item = CostItem::new(raw.name, raw.amount, raw.frequency, raw.quantity)?;
        match raw.variability {
            Some(v) => item.with_variability(v),
            None => Ok(item),
        }
    }
}

impl CostItem {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        frequency: Frequency,
        quantity: u32,
    ) -> Result<Self, AppError> {
        let name = name.into();
        if amount < Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "Cost item '{name}' has negative amount {amount}."
            )));
        }
        if quantity == 0 {
            return Err(AppError::Validation(format!(
                "Cost item '{name}' must have a quantity of at least 1."
            )));
        }
        let within_bound = amount
            .checked_mul(Decimal::from(quantity))
            .is_some_and(|extended| extended <= Decimal::from(MAX_EXTENDED_AMOUNT));
        if !within_bound {
            return Err(AppError::Validation(format!(
                "Cost item '{name}' amount {amount} × quantity {quantity} exceeds {MAX_EXTENDED_AMOUNT}."
            )));
        }
        Ok(Self {
            name,
            amount,
            frequency,
            quantity,
            variability: None,
        })
    }

    pub fn with_variability(mut self, variability: Decimal) -> Result<Self, AppError> {
        if variability < Decimal::ZERO || variability > Decimal::ONE {
            return Err(AppError::Validation(format!(
                "Cost item '{}' variability {variability} is outside [0, 1].",
                self.name
            )));
        }
        self.variability = Some(variability);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn variability(&self) -> Option<Decimal> {
        self.variability
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency.is_recurring()
    }

    /// Undiscounted `amount × quantity`, independent of frequency.
    pub fn extended_amount(&self) -> Decimal {
        self.amount * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCategory {
    pub name: String,
    #[serde(default)]
    pub items: Vec<CostItem>,
}

impl CostCategory {
    pub fn new(name: impl Into<String>, items: Vec<CostItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostScenario {
    pub name: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub categories: Vec<CostCategory>,
}

impl CostScenario {
    pub fn new(name: impl Into<String>, categories: Vec<CostCategory>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            active: false,
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub index: u32,
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub one_time_cost: Decimal,
    pub recurring_cost: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioTotals {
    pub monthly: Decimal,
    pub one_time: Decimal,
    pub yearly: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    Baseline,
    /// `percent` is `None` when the baseline yearly total is zero.
    Delta {
        amount: Decimal,
        percent: Option<Decimal>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub scenario: String,
    pub active: bool,
    pub totals: ScenarioTotals,
    pub difference: Difference,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn frequency_parses_known_tags_case_insensitively() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!(" one-time ".parse::<Frequency>().unwrap(), Frequency::OneTime);
        assert_eq!("one_time".parse::<Frequency>().unwrap(), Frequency::OneTime);
        assert_eq!("YEARLY".parse::<Frequency>().unwrap(), Frequency::Yearly);
    }

    #[test]
    fn frequency_strict_parse_rejects_unknown_tag() {
        let err = "fortnightly".parse::<Frequency>().expect_err("unknown tag");
        assert!(err.to_string().contains("Unknown frequency 'fortnightly'"));
    }

    #[test]
    fn only_one_time_is_not_recurring() {
        for f in Frequency::ALL {
            assert_eq!(f.is_recurring(), f != Frequency::OneTime);
        }
    }

    #[test]
    fn cost_item_rejects_negative_amount_and_zero_quantity() {
        let err = CostItem::new("rent", dec!(-1), Frequency::Monthly, 1).expect_err("negative");
        assert!(err.to_string().contains("negative amount"));

        let err = CostItem::new("rent", dec!(10), Frequency::Monthly, 0).expect_err("zero qty");
        assert!(err.to_string().contains("quantity of at least 1"));
    }

    #[test]
    fn cost_item_rejects_extended_amount_above_bound() {
        let err = CostItem::new("big", dec!(1000000000000000000000000), Frequency::Hourly, 1000)
            .expect_err("too large");
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("exceeds"));

        assert!(CostItem::new("edge", dec!(1000000000000), Frequency::Hourly, 1000).is_ok());
        assert!(CostItem::new("over", dec!(1000000000000), Frequency::Hourly, 1001).is_err());
        assert!(CostItem::new("max", Decimal::MAX, Frequency::Monthly, 2).is_err());
    }

    #[test]
    fn cost_item_accepts_zero_amount() {
        let item = CostItem::new("free tier", dec!(0), Frequency::Monthly, 1).expect("valid");
        assert_eq!(item.amount(), Decimal::ZERO);
    }

    #[test]
    fn variability_must_be_a_fraction() {
        let item = CostItem::new("cloud", dec!(100), Frequency::Monthly, 1).expect("valid");
        assert!(item.clone().with_variability(dec!(0.25)).is_ok());
        assert!(item.clone().with_variability(dec!(1)).is_ok());
        assert!(item.clone().with_variability(dec!(1.5)).is_err());
        assert!(item.with_variability(dec!(-0.1)).is_err());
    }

    #[test]
    fn deserialize_validates_items() {
        let ok: CostItem = serde_json::from_str(
            r#"{"name":"saas","amount":"49.90","frequency":"monthly","quantity":3}"#,
        )
        .expect("valid item");
        assert_eq!(ok.amount(), dec!(49.90));
        assert_eq!(ok.quantity(), 3);

        let defaulted: CostItem =
            serde_json::from_str(r#"{"name":"laptop","amount":1200,"frequency":"one-time"}"#)
                .expect("quantity defaults to 1");
        assert_eq!(defaulted.quantity(), 1);
        assert!(!defaulted.is_recurring());

        let bad = serde_json::from_str::<CostItem>(
            r#"{"name":"x","amount":-5,"frequency":"monthly","quantity":1}"#,
        );
        assert!(bad.is_err());

        let bad_variability = serde_json::from_str::<CostItem>(
            r#"{"name":"x","amount":5,"frequency":"monthly","variability":2}"#,
        );
        assert!(bad_variability.is_err());
    }

    #[test]
    fn deserialize_falls_back_to_monthly_for_unknown_tag() {
        let item: CostItem = serde_json::from_str(
            r#"{"name":"legacy","amount":10,"frequency":"biweekly","quantity":1}"#,
        )
        .expect("lenient frequency");
        assert_eq!(item.frequency(), Frequency::Monthly);
    }

    #[test]
    fn frequency_serializes_as_kebab_case_tag() {
        let json = serde_json::to_string(&Frequency::OneTime).expect("serialize");
        assert_eq!(json, "\"one-time\"");
    }

    #[test]
    fn scenario_defaults_optional_fields_on_import() {
        let scenario: CostScenario =
            serde_json::from_str(r#"{"name":"baseline","categories":[]}"#).expect("scenario");
        assert!(!scenario.active);
        assert!(scenario.categories.is_empty());
    }
}
