//! Configuration type definitions.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `settings.yaml`. Every section and field has a
//! default, so a settings file only needs to name what it overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_BREAK_DURATION_MINUTES;

/// Company identity shown next to reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanySettings {
    /// Company display name.
    pub name: String,
    /// Currency code used when presenting salary figures.
    pub currency: String,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            name: "TimeTracker24".to_string(),
            currency: "EUR".to_string(),
        }
    }
}

/// Attendance policy defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceSettings {
    /// Break cap given to new employees that do not specify one, in minutes.
    pub default_break_minutes: u32,
    /// How long a tag registration waits for the next scan.
    pub registration_timeout_secs: u64,
    /// Sub-second override of the registration timeout, in milliseconds.
    ///
    /// Takes precedence over `registration_timeout_secs` when set.
    pub registration_timeout_ms: Option<u64>,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            default_break_minutes: DEFAULT_BREAK_DURATION_MINUTES,
            registration_timeout_secs: 30,
            registration_timeout_ms: None,
        }
    }
}

impl AttendanceSettings {
    /// The registration wait as a duration.
    pub fn registration_timeout(&self) -> Duration {
        match self.registration_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.registration_timeout_secs),
        }
    }
}

/// Where the local cache and the remote document directory live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Local durable store: offline copies, sync queue and tag bindings.
    pub local_dir: PathBuf,
    /// Remote document directory, typically a mounted share.
    pub remote_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::from("./data/local"),
            remote_dir: PathBuf::from("./data/remote"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// How often the remote store is probed for connectivity.
    pub probe_interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            probe_interval_secs: 15,
        }
    }
}

impl SyncSettings {
    /// The probe interval as a duration.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs.max(1))
    }
}

/// Complete application settings, as read from `settings.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Company identity.
    pub company: CompanySettings,
    /// Attendance policy defaults.
    pub attendance: AttendanceSettings,
    /// Storage locations.
    pub storage: StorageSettings,
    /// HTTP server.
    pub server: ServerSettings,
    /// Reconciliation.
    pub sync: SyncSettings,
}
