//! Salary estimate from worked hours.

use rust_decimal::Decimal;

use super::rounding::round_half_up;

/// Estimates pay for `hours` at `hourly_rate`, rounded to a whole currency unit.
///
/// Returns `None` when the rate is missing, zero or negative, so callers omit
/// the figure instead of showing a zero salary.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::salary;
/// use rust_decimal::Decimal;
///
/// assert_eq!(salary(Decimal::new(85, 1), Some(Decimal::new(1500, 0))), Some(Decimal::new(12750, 0)));
/// assert_eq!(salary(Decimal::new(85, 1), Some(Decimal::ZERO)), None);
/// assert_eq!(salary(Decimal::new(85, 1), None), None);
/// ```
pub fn salary(hours: Decimal, hourly_rate: Option<Decimal>) -> Option<Decimal> {
    let rate = hourly_rate.filter(|rate| *rate > Decimal::ZERO)?;
    Some(round_half_up(hours * rate, 0))
}
