//! Configuration loading and management for the time-clock engine.
//!
//! This module provides functionality to load application settings from a
//! YAML file: company identity, attendance defaults, storage locations, the
//! HTTP bind address and the connectivity probe interval.
//!
//! # Example
//!
//! ```no_run
//! use timeclock_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Listening on {}", loader.settings().server.bind);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, SETTINGS_FILE};
pub use types::{
    AttendanceSettings, CompanySettings, ServerSettings, Settings, StorageSettings, SyncSettings,
};
