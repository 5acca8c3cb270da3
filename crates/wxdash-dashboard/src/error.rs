//! Maps fetch failures to the messages shown on the dashboard.

use std::fmt;

use wxdash_core::{AppError, ReqwestErrorExt, WeatherError as DashboardWeatherError};
use wxdash_weather::WeatherError;

/// Dashboard sections that can fail on their own without blanking the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    SevenDay,
    History,
    Moon,
    Forecast,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::SevenDay => "7-day history",
            Section::History => "30-day history",
            Section::Moon => "Moon phase",
            Section::Forecast => "Forecast",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An error as displayed: a short message for the banner or the inline
/// notice, plus the full chain for logs and a details toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub message: String,
    pub detail: String,
}

impl ErrorNotice {
    pub fn from_app_error(err: &AppError) -> Self {
        Self {
            message: err.user_message().to_string(),
            detail: err.to_string(),
        }
    }

    /// Notice for a failed current/hourly fetch, which abandons the cycle.
    pub fn fatal(err: WeatherError) -> Self {
        Self::from_app_error(&fatal_app_error(err))
    }

    /// Inline notice for one failed section.
    pub fn section(section: Section, err: &WeatherError) -> Self {
        let app_err = AppError::Weather(DashboardWeatherError::SectionUnavailable {
            section: section.label().to_string(),
            message: err.to_string(),
        });
        Self::from_app_error(&app_err)
    }
}

fn fatal_app_error(err: WeatherError) -> AppError {
    match err {
        WeatherError::Network(e) => AppError::Network(e.into_network_error()),
        WeatherError::Io(e) => AppError::Io(e),
        other => AppError::Weather(DashboardWeatherError::ObservationsUnavailable(
            other.to_string(),
        )),
    }
}
