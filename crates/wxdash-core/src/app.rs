use anyhow::Result;
use std::path::PathBuf;

use crate::config::{Config, ConfigStore};

/// Main application state and lifecycle manager.
///
/// Preferences are loaded once here at startup; afterwards every change
/// goes through `preferences_mut()` and is saved immediately.
pub struct App {
    preferences: ConfigStore,
}

impl App {
    /// Create a new application instance from the default config location
    pub fn new() -> Result<Self> {
        Self::with_config_path(Config::default_path()?)
    }

    /// Create an application instance backed by a specific config file
    pub fn with_config_path(path: impl Into<PathBuf>) -> Result<Self> {
        let (preferences, validation) = ConfigStore::load_validated_from(path)?;
        tracing::info!(
            "Loaded configuration from {} ({} warnings)",
            preferences.path().display(),
            validation.warnings.len()
        );
        Ok(Self { preferences })
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        self.preferences.config()
    }

    /// Mutable access to the persisted preferences
    pub fn preferences_mut(&mut self) -> &mut ConfigStore {
        &mut self.preferences
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        self.preferences.save()
    }
}
