//! Automatic break deduction.
//!
//! This module computes the break time deducted from a shift by policy,
//! independent of any manually logged pauses: 15 minutes for every complete
//! block of 3 hours, capped by the employee's break duration.

use chrono::NaiveDateTime;

/// Length of one break-earning block, in hours.
pub const BREAK_BLOCK_HOURS: i64 = 3;

/// Minutes of break earned per complete block.
pub const MINUTES_PER_BREAK_BLOCK: u32 = 15;

/// Cap applied when no positive break policy is supplied, in minutes.
pub const DEFAULT_MAX_BREAK_MINUTES: u32 = 30;

const MILLIS_PER_BLOCK: i64 = BREAK_BLOCK_HOURS * 60 * 60 * 1000;

/// Calculates the automatic break deduction for a shift, in minutes.
///
/// The worked span is split into complete blocks of [`BREAK_BLOCK_HOURS`];
/// each block earns [`MINUTES_PER_BREAK_BLOCK`] minutes, and the total is capped at
/// `max_break_minutes`. A missing or zero cap falls back to
/// [`DEFAULT_MAX_BREAK_MINUTES`].
///
/// Returns 0 while the shift is open (`end_time` is `None`) and for spans
/// that are empty or negative.
///
/// # Examples
///
/// ```
/// use timeclock_engine::calculation::automatic_break_minutes;
/// use chrono::NaiveDateTime;
///
/// let start = NaiveDateTime::parse_from_str("2026-01-15 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let end = NaiveDateTime::parse_from_str("2026-01-15 17:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// // 9 hours earns 45 minutes, capped at 30.
/// assert_eq!(automatic_break_minutes(start, Some(end), None), 30);
/// assert_eq!(automatic_break_minutes(start, Some(end), Some(60)), 45);
/// assert_eq!(automatic_break_minutes(start, None, None), 0);
/// ```
pub fn automatic_break_minutes(
    start_time: NaiveDateTime,
    end_time: Option<NaiveDateTime>,
    max_break_minutes: Option<u32>,
) -> u32 {
    let Some(end_time) = end_time else {
        return 0;
    };

    let span_ms = (end_time - start_time).num_milliseconds();
    if span_ms <= 0 {
        return 0;
    }

    let blocks = span_ms / MILLIS_PER_BLOCK;
    let earned = u32::try_from(blocks)
        .unwrap_or(u32::MAX)
        .saturating_mul(MINUTES_PER_BREAK_BLOCK);
    let cap = max_break_minutes
        .filter(|minutes| *minutes > 0)
        .unwrap_or(DEFAULT_MAX_BREAK_MINUTES);

    earned.min(cap)
}
