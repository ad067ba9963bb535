//! Application state for the time-clock API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::engine::AttendanceEngine;

/// Shared application state.
///
/// Contains the attendance engine every handler drives and the loaded
/// settings.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<AttendanceEngine>,
    config: Arc<ConfigLoader>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(engine: Arc<AttendanceEngine>, config: ConfigLoader) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }

    /// Returns the attendance engine.
    pub fn engine(&self) -> &AttendanceEngine {
        &self.engine
    }

    /// Returns the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Required for axum state
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<AppState>();
    }
}
