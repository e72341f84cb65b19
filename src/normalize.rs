use crate::models::{CostItem, Frequency};
use rust_decimal::Decimal;

/// Working hours in a month.
pub const HOURS_PER_MONTH: u32 = 160;
/// Working days in a month.
pub const DAYS_PER_MONTH: u32 = 22;
/// Average weeks in a month, 4.33.
pub const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);

/// Monthly-equivalent cost of a single item.
///
/// One-time items contribute nothing here; they are reported through
/// [`crate::aggregate::one_time_total`]. For hourly items `quantity` still
/// multiplies on top of the 160 working hours, so a quantity that already
/// means "hours" is counted twice.
pub fn normalize_to_monthly(item: &CostItem) -> Decimal {
    let base = item.extended_amount();
    match item.frequency() {
        Frequency::OneTime => Decimal::ZERO,
        Frequency::Hourly => base * Decimal::from(HOURS_PER_MONTH),
        Frequency::Daily => base * Decimal::from(DAYS_PER_MONTH),
        Frequency::Weekly => base * WEEKS_PER_MONTH,
        Frequency::Monthly => base,
        Frequency::Quarterly => base / Decimal::from(3),
        Frequency::Yearly => base / Decimal::from(12),
    }
}

/// Symmetric uncertainty band `(low, high)` around the monthly equivalent.
pub fn monthly_range(item: &CostItem) -> (Decimal, Decimal) {
    let monthly = normalize_to_monthly(item);
    match item.variability() {
        Some(v) => (monthly * (Decimal::ONE - v), monthly * (Decimal::ONE + v)),
        None => (monthly, monthly),
    }
}
