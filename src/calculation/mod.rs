//! Calculation logic for the time-clock engine.
//!
//! This module contains the pure functions that turn recorded shifts into
//! figures: the automatic break deduction, worked duration, manual break
//! totals, salary estimates, weekly and per-employee statistics, and the
//! attendance register. None of them perform I/O or read the clock; the
//! reference time is always passed in.

mod automatic_break;
mod duration;
mod employee_stats;
mod filter;
mod manual_breaks;
mod register;
mod rounding;
mod salary;
mod weekly_stats;

pub use automatic_break::{
    BREAK_BLOCK_HOURS, DEFAULT_MAX_BREAK_MINUTES, MINUTES_PER_BREAK_BLOCK, automatic_break_minutes,
};
pub use duration::{compute_duration, entry_duration};
pub use employee_stats::employee_stats;
pub use filter::filter_entries;
pub use manual_breaks::manual_break_minutes;
pub use register::register_rows;
pub use rounding::round_half_up;
pub use salary::salary;
pub use weekly_stats::{STANDARD_MONTHLY_HOURS, STANDARD_WEEKLY_HOURS, weekly_stats};
