//! Open-Meteo forecast client.

use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::error::WeatherError;
use crate::source::{Forecast, ForecastSource};
use crate::types::{ForecastHour, Location, SunTimes};

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const FORECAST_DAYS: u32 = 16;
const USER_AGENT: &str = concat!("wxdash/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Client,
    base_url: String,
    location: Location,
    timezone: Tz,
}

impl OpenMeteoProvider {
    pub fn new(location: Location, timezone: Tz) -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_BASE_URL, location, timezone)
    }

    /// Point the client at another host (a mirror, or a mock server in tests).
    pub fn with_base_url(
        base_url: &str,
        location: Location,
        timezone: Tz,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            location,
            timezone,
        })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch(&self) -> Result<Forecast, WeatherError> {
        let url = format!("{}/v1/forecast", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", self.location.latitude.to_string()),
                ("longitude", self.location.longitude.to_string()),
                (
                    "hourly",
                    "temperature_2m,precipitation_probability,weather_code".to_string(),
                ),
                ("daily", "sunrise,sunset".to_string()),
                ("timezone", self.timezone.name().to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
                ("timeformat", "unixtime".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        let parsed: OpenMeteoResponse = serde_json::from_str(&body)?;
        let forecast = parse_response(parsed, self.timezone)?;
        tracing::info!(
            "Fetched {} forecast hours (sun times: {})",
            forecast.hours.len(),
            forecast.sun.is_some()
        );
        Ok(forecast)
    }
}

impl ForecastSource for OpenMeteoProvider {
    async fn forecast(&self) -> Result<Forecast, WeatherError> {
        self.fetch().await
    }
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: Option<HourlyBlock>,
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Vec<i64>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    #[serde(default)]
    sunrise: Vec<Option<i64>>,
    #[serde(default)]
    sunset: Vec<Option<i64>>,
}

fn parse_response(response: OpenMeteoResponse, tz: Tz) -> Result<Forecast, WeatherError> {
    let hourly = response
        .hourly
        .ok_or_else(|| WeatherError::MissingField("hourly".to_string()))?;

    let hours = hourly
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, &unix)| {
            let time = DateTime::from_timestamp(unix, 0)?
                .with_timezone(&tz)
                .naive_local();
            Some(ForecastHour {
                time,
                temperature: hourly.temperature_2m.get(i).copied().flatten(),
                precipitation_probability: hourly
                    .precipitation_probability
                    .get(i)
                    .copied()
                    .flatten(),
                weather_code: hourly.weather_code.get(i).copied().flatten(),
            })
        })
        .collect();

    let sun = response.daily.and_then(|daily| {
        let sunrise = daily.sunrise.first().copied().flatten()?;
        let sunset = daily.sunset.first().copied().flatten()?;
        Some(SunTimes {
            sunrise: DateTime::from_timestamp(sunrise, 0)?,
            sunset: DateTime::from_timestamp(sunset, 0)?,
        })
    });
    if sun.is_none() {
        tracing::debug!("Forecast response has no sun times");
    }

    Ok(Forecast { hours, sun })
}
