use crate::aggregate::{overflow, scenario_totals};
use crate::error::AppError;
use crate::models::{ComparisonRow, CostScenario, Difference};
use rust_decimal::Decimal;

/// Baseline row first, then one row per scenario in the given order.
pub fn compare_scenarios(
    baseline: &CostScenario,
    others: &[CostScenario],
) -> Result<Vec<ComparisonRow>, AppError> {
    let base = scenario_totals(&baseline.categories)?;
    let mut rows = Vec::with_capacity(others.len() + 1);
    rows.push(ComparisonRow {
        scenario: baseline.name.clone(),
        active: baseline.active,
        totals: base,
        difference: Difference::Baseline,
    });

    for other in others {
        let totals = scenario_totals(&other.categories)?;
        let amount = totals
            .yearly
            .checked_sub(base.yearly)
            .ok_or_else(overflow)?;
        let percent = if base.yearly.is_zero() {
            None
        } else {
            let ratio = amount
                .checked_mul(Decimal::ONE_HUNDRED)
                .and_then(|scaled| scaled.checked_div(base.yearly))
                .ok_or_else(overflow)?;
            Some(ratio.normalize())
        };
        tracing::debug!(
            baseline = %baseline.name,
            scenario = %other.name,
            %amount,
            "compared scenario"
        );
        rows.push(ComparisonRow {
            scenario: other.name.clone(),
            active: other.active,
            totals,
            difference: Difference::Delta { amount, percent },
        });
    }

    Ok(rows)
}

/// The active scenario of a set, if any. Two or more active is an error.
pub fn active_scenario(scenarios: &[CostScenario]) -> Result<Option<&CostScenario>, AppError> {
    let mut active = scenarios.iter().filter(|s| s.active);
    let first = active.next();
    if let Some(second) = active.next() {
        return Err(AppError::Validation(format!(
            "More than one active scenario ('{}', '{}').",
            first.map(|s| s.name.as_str()).unwrap_or_default(),
            second.name
        )));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostCategory, CostItem, Frequency};
    use rust_decimal_macros::dec;

    fn scenario(name: &str, monthly: Decimal, one_time: Decimal) -> CostScenario {
        CostScenario::new(
            name,
            vec![CostCategory::new(
                "All",
                vec![
                    CostItem::new("run", monthly, Frequency::Monthly, 1).expect("valid"),
                    CostItem::new("setup", one_time, Frequency::OneTime, 1).expect("valid"),
                ],
            )],
        )
    }

    #[test]
    fn baseline_row_is_reference_not_zero_delta() {
        let base = scenario("Current", dec!(500), dec!(3000));
        let rows = compare_scenarios(&base, &[]).expect("compare");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].difference, Difference::Baseline);
        assert_eq!(rows[0].totals.yearly, dec!(500) * dec!(12) + dec!(3000));
    }

    #[test]
    fn delta_is_yearly_difference_and_percentage() {
        let base = scenario("Current", dec!(500), dec!(3000));
        let alt = scenario("Upgrade", dec!(650), dec!(3000));
        let rows = compare_scenarios(&base, &[alt]).expect("compare");
        assert_eq!(rows[0].totals.yearly, dec!(9000));
        assert_eq!(rows[1].totals.yearly, dec!(10800));
        assert_eq!(
            rows[1].difference,
            Difference::Delta {
                amount: dec!(1800),
                percent: Some(dec!(20)),
            }
        );
    }

    #[test]
    fn cheaper_scenario_has_negative_delta() {
        let base = scenario("Current", dec!(1000), dec!(0));
        let rows =
            compare_scenarios(&base, &[scenario("Lean", dec!(750), dec!(0))]).expect("compare");
        assert_eq!(
            rows[1].difference,
            Difference::Delta {
                amount: dec!(-3000),
                percent: Some(dec!(-25)),
            }
        );
    }

    #[test]
    fn zero_baseline_reports_percent_not_applicable() {
        let base = scenario("Nothing", dec!(0), dec!(0));
        let rows = compare_scenarios(&base, &[scenario("Something", dec!(10), dec!(0))])
            .expect("compare");
        assert_eq!(
            rows[1].difference,
            Difference::Delta {
                amount: dec!(120),
                percent: None,
            }
        );
    }

    #[test]
    fn rows_keep_input_order() {
        let base = scenario("B", dec!(100), dec!(0));
        let others = vec![
            scenario("Z", dec!(900), dec!(0)),
            scenario("A", dec!(10), dec!(0)),
            scenario("M", dec!(300), dec!(0)),
        ];
        let names: Vec<_> = compare_scenarios(&base, &others)
            .expect("compare")
            .into_iter()
            .map(|r| r.scenario)
            .collect();
        assert_eq!(names, vec!["B", "Z", "A", "M"]);
    }

    #[test]
    fn percent_against_tiny_baseline_overflows_to_error() {
        let base = scenario("Dust", dec!(0.0000000000000000000000001), dec!(0));
        let huge = scenario("Huge", dec!(1000000000000000), dec!(1000000000000000));
        let err = compare_scenarios(&base, &[huge]).expect_err("percent overflows");
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn active_scenario_allows_at_most_one() {
        let mut a = scenario("A", dec!(1), dec!(0));
        let mut b = scenario("B", dec!(1), dec!(0));
        assert!(active_scenario(&[a.clone(), b.clone()]).expect("none").is_none());

        a.active = true;
        let set = [a.clone(), b.clone()];
        let found = active_scenario(&set).expect("one");
        assert_eq!(found.map(|s| s.name.as_str()), Some("A"));

        b.active = true;
        let err = active_scenario(&[a, b]).expect_err("two active");
        assert!(err.to_string().contains("More than one active scenario"));
    }
}
