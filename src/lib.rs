//! Time-clock attendance engine.
//!
//! This crate records employee shifts from NFC badge taps or UI buttons, maintains the
//! per-employee attendance state machine (clock in, breaks, clock out), computes worked
//! durations net of automatic break deductions, and reconciles entries captured while the
//! remote document store was unreachable.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;
