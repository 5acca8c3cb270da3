//! Where raw weather data comes from.
//!
//! Sources only hand back raw records; normalization and derivation happen
//! afterwards, on the caller's side.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::WeatherError;
use crate::normalize::FieldMapping;
use crate::types::{CurrentObservation, ForecastHour, MoonInfo, SunTimes};

/// The three historical series a station publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesFeed {
    /// Last ~24h at the station's native interval
    Hourly,
    /// Last 7 days, hourly
    SevenDay,
    /// Up to 30 daily summaries
    Daily,
}

impl SeriesFeed {
    pub fn mapping(&self) -> FieldMapping {
        match self {
            SeriesFeed::Hourly => FieldMapping::hourly(),
            SeriesFeed::SevenDay => FieldMapping::seven_day(),
            SeriesFeed::Daily => FieldMapping::daily(),
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            SeriesFeed::Hourly => "hourly.json",
            SeriesFeed::SevenDay => "week.json",
            SeriesFeed::Daily => "daily.json",
        }
    }
}

/// Personal weather station data.
pub trait StationSource: Send + Sync {
    fn current(&self) -> impl Future<Output = Result<CurrentObservation, WeatherError>> + Send;

    /// Raw records of one series, in whatever order the station sent them.
    fn series(
        &self,
        feed: SeriesFeed,
    ) -> impl Future<Output = Result<Vec<Value>, WeatherError>> + Send;

    fn moon(&self) -> impl Future<Output = Result<MoonInfo, WeatherError>> + Send;
}

/// Hourly forecast plus today's sun times, usually from one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub hours: Vec<ForecastHour>,
    pub sun: Option<SunTimes>,
}

pub trait ForecastSource: Send + Sync {
    fn forecast(&self) -> impl Future<Output = Result<Forecast, WeatherError>> + Send;
}

/// Reads station exports from a directory of JSON files.
///
/// Expected files: `current.json`, `hourly.json`, `week.json`, `daily.json`
/// and `moon.json`. Series files hold either a bare array of records or an
/// object wrapping one under `observations` or `summaries`.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    dir: PathBuf,
}

impl SnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_json(&self, file_name: &str) -> Result<Value, WeatherError> {
        let path = self.dir.join(file_name);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WeatherError::Source(format!(
                    "snapshot file not found: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Read snapshot {}", path.display());
        Ok(serde_json::from_str(&text)?)
    }
}

impl StationSource for SnapshotSource {
    async fn current(&self) -> Result<CurrentObservation, WeatherError> {
        let value = self.read_json("current.json").await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn series(&self, feed: SeriesFeed) -> Result<Vec<Value>, WeatherError> {
        let value = self.read_json(feed.file_name()).await?;
        extract_records(value, feed.file_name())
    }

    async fn moon(&self) -> Result<MoonInfo, WeatherError> {
        let value = self.read_json("moon.json").await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn extract_records(value: Value, file_name: &str) -> Result<Vec<Value>, WeatherError> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut map) => {
            for key in ["observations", "summaries"] {
                if let Some(Value::Array(records)) = map.remove(key) {
                    return Ok(records);
                }
            }
            Err(WeatherError::MissingField(format!(
                "{}: observations",
                file_name
            )))
        }
        _ => Err(WeatherError::Source(format!(
            "{}: expected an array of records",
            file_name
        ))),
    }
}
