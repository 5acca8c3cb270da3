use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Station location and display timezone
    pub station: StationConfig,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    pub latitude: f64,
    pub longitude: f64,

    /// IANA timezone used for every local-day boundary (e.g. "Europe/Paris")
    pub timezone: String,

    /// Directory holding the station's raw JSON exports
    #[serde(default)]
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            latitude: 48.8566,
            longitude: 2.3522,
            timezone: "Europe/Paris".to_string(),
            snapshot_dir: None,
        }
    }
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius reading into this unit.
    pub fn from_celsius(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Temperature unit preference
    pub temperature_unit: TemperatureUnit,

    /// Refresh interval in minutes
    pub refresh_minutes: u32,

    /// Base URL of the Open-Meteo forecast API
    #[serde(default = "default_forecast_api_url")]
    pub forecast_api_url: String,
}

fn default_forecast_api_url() -> String {
    "https://api.open-meteo.com".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperatureUnit::Celsius,
            refresh_minutes: 10,
            forecast_api_url: default_forecast_api_url(),
        }
    }
}

/// Chart range shown when the dashboard opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartRangeSetting {
    #[default]
    Day,
    SevenDays,
    ThirtyDays,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Dark mode enabled
    pub dark_mode: bool,

    #[serde(default)]
    pub chart_range: ChartRangeSetting,

    /// Language tag for the string tables (e.g. "en", "fr")
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            chart_range: ChartRangeSetting::Day,
            language: default_language(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wxdash");

        Self {
            config_dir,
            station: StationConfig::default(),
            weather: WeatherConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Parse the configured timezone, falling back to UTC.
    pub fn display_timezone(&self) -> Tz {
        match self.station.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    "Unknown timezone '{}', falling back to UTC",
                    self.station.timezone
                );
                Tz::UTC
            }
        }
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(
            &self.weather.forecast_api_url,
            "weather.forecast_api_url",
            &mut result,
        );

        if self.station.timezone.parse::<Tz>().is_err() {
            result.add_error(
                "station.timezone",
                format!("Unknown timezone: {}", self.station.timezone),
            );
        }

        if !(-90.0..=90.0).contains(&self.station.latitude) {
            result.add_error("station.latitude", "Latitude must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&self.station.longitude) {
            result.add_error("station.longitude", "Longitude must be within [-180, 180]");
        }

        match &self.station.snapshot_dir {
            None => result.add_warning(
                "station.snapshot_dir",
                "No station snapshot directory configured - observations will be unavailable",
            ),
            Some(dir) if !dir.is_dir() => result.add_warning(
                "station.snapshot_dir",
                format!("Path is not a directory: {}", dir.display()),
            ),
            Some(_) => {}
        }

        // Validate weather refresh interval
        if self.weather.refresh_minutes == 0 {
            result.add_error(
                "weather.refresh_minutes",
                "Refresh interval must be at least 1 minute",
            );
        } else if self.weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if self.ui.language.trim().is_empty() {
            result.add_warning("ui.language", "Empty language tag, using English");
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                // Check scheme
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                // Check host
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if let Some(port) = url.port() {
                    if port == 0 {
                        result.add_error(field_name, "Port cannot be 0");
                    }
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Get the default path to the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxdash");

        Ok(config_dir.join("config.toml"))
    }
}

/// Owns the loaded configuration and writes it back on every change.
///
/// All mutation goes through the typed setters below; each one validates
/// its input, updates the in-memory value and saves the file.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    /// Load from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Config::default_path()?)
    }

    /// Load configuration from `path`, writing defaults if the file is missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let mut config = Config::default();
            if let Some(parent) = path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            let store = Self { path, config };
            store.save()?;
            return Ok(store);
        }

        let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(Self { path, config })
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated_from(path: impl Into<PathBuf>) -> Result<(Self, ValidationResult)> {
        let store = Self::load_from(path)?;
        let validation = store.config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((store, validation))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents =
            toml::to_string_pretty(&self.config).context("Failed to serialize config")?;

        std::fs::write(&self.path, contents).context("Failed to write config file")?;

        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.config.ui.dark_mode = enabled;
        self.save()
    }

    pub fn set_temperature_unit(&mut self, unit: TemperatureUnit) -> Result<()> {
        self.config.weather.temperature_unit = unit;
        self.save()
    }

    pub fn set_chart_range(&mut self, range: ChartRangeSetting) -> Result<()> {
        self.config.ui.chart_range = range;
        self.save()
    }

    pub fn set_language(&mut self, language: impl Into<String>) -> Result<()> {
        self.config.ui.language = language.into();
        self.save()
    }

    pub fn set_refresh_minutes(&mut self, minutes: u32) -> Result<()> {
        if minutes == 0 {
            anyhow::bail!("Refresh interval must be at least 1 minute");
        }
        self.config.weather.refresh_minutes = minutes;
        self.save()
    }

    pub fn set_timezone(&mut self, timezone: &str) -> Result<()> {
        timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {}", timezone, e))?;
        self.config.station.timezone = timezone.to_string();
        self.save()
    }

    pub fn set_location(&mut self, latitude: f64, longitude: f64) -> Result<()> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            anyhow::bail!("Coordinates out of range: {}, {}", latitude, longitude);
        }
        self.config.station.latitude = latitude;
        self.config.station.longitude = longitude;
        self.save()
    }
}
