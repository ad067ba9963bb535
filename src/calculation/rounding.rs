//! Rounding helpers shared by the reporting figures.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to `dp` decimal places, with midpoints rounded away from zero.
///
/// Reporting figures are rounded the way a person would on paper, so 2.25
/// becomes 2.3 at one decimal place, not the banker's 2.2.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::round_half_up;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_half_up(Decimal::new(225, 2), 1), Decimal::new(23, 1));
/// assert_eq!(round_half_up(Decimal::new(5, 1), 0), Decimal::ONE);
/// ```
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a figure for display at one decimal place.
pub(crate) fn one_decimal(value: Decimal) -> Decimal {
    round_half_up(value, 1)
}
