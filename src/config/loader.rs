//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading application
//! settings from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::Settings;

/// Name of the settings file inside a configuration directory.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// Loads and provides access to application settings.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// └── settings.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use timeclock_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// println!("Company: {}", loader.settings().company.name);
/// # Ok::<(), timeclock_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: Settings,
}

impl ConfigLoader {
    /// Loads settings from `settings.yaml` in the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - The file is missing or unreadable (`ConfigNotFound`)
    /// - The file contains invalid YAML or mistyped fields (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let settings_path = path.as_ref().join(SETTINGS_FILE);
        let settings = Self::load_yaml::<Settings>(&settings_path)?;
        Ok(Self { settings })
    }

    /// Builds a loader around settings constructed in memory.
    pub fn from_settings(settings: Settings) -> Self {
        Self { settings }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the loaded settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Consumes the loader, returning the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn write_settings(dir: &Path, content: &str) {
        fs::write(dir.join(SETTINGS_FILE), content).unwrap();
    }

    #[test]
    fn test_load_full_settings() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(
            dir.path(),
            r#"
company:
  name: "Boulangerie Ndiaye"
  currency: "XOF"
attendance:
  default_break_minutes: 45
  registration_timeout_secs: 20
storage:
  local_dir: "/var/lib/timeclock/local"
  remote_dir: "/mnt/share/timeclock"
server:
  bind: "127.0.0.1:9000"
sync:
  probe_interval_secs: 5
"#,
        );

        let loader = ConfigLoader::load(dir.path()).unwrap();
        let settings = loader.settings();
        assert_eq!(settings.company.currency, "XOF");
        assert_eq!(settings.attendance.default_break_minutes, 45);
        assert_eq!(
            settings.attendance.registration_timeout(),
            Duration::from_secs(20)
        );
        assert_eq!(
            settings.storage.remote_dir,
            PathBuf::from("/mnt/share/timeclock")
        );
        assert_eq!(settings.server.bind, "127.0.0.1:9000");
        assert_eq!(settings.sync.probe_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(dir.path(), "company:\n  name: \"Garage Sow\"\n");

        let settings = ConfigLoader::load(dir.path()).unwrap().into_settings();
        assert_eq!(settings.company.name, "Garage Sow");
        assert_eq!(settings.company.currency, "EUR");
        assert_eq!(settings.attendance.default_break_minutes, 30);
        assert_eq!(
            settings.attendance.registration_timeout(),
            Duration::from_secs(30)
        );
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_millisecond_timeout_overrides_seconds() {
        let mut settings = Settings::default();
        settings.attendance.registration_timeout_ms = Some(50);
        let loader = ConfigLoader::from_settings(settings);
        assert_eq!(
            loader.settings().attendance.registration_timeout(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        assert!(result.is_err());

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("/nonexistent/path"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_load_invalid_yaml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write_settings(dir.path(), "attendance:\n  default_break_minutes: lots\n");

        match ConfigLoader::load(dir.path()) {
            Err(EngineError::ConfigParseError { path, message }) => {
                assert!(path.ends_with(SETTINGS_FILE));
                assert!(!message.is_empty());
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }
    }
}
