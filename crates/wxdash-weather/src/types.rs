use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes, ordered by severity
/// (later variants outrank earlier ones).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    MainlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    Rain,
    Snow,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    ///
    /// Returns `None` for codes outside the WMO table.
    pub fn from_wmo_code(code: i32) -> Option<Self> {
        let condition = match code {
            0 => Self::Clear,
            1 => Self::MainlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51..=57 | 61..=67 | 80..=82 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => return None,
        };
        Some(condition)
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::MainlyClear => "Mainly Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Geographic location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// One time-stamped reading, in canonical units (°C, %, hPa, mm, mm/h, km/h).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPoint {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub pressure_min: Option<f64>,
    pub pressure_max: Option<f64>,
    /// Rain accumulated during this sample's interval
    pub precip_amount: f64,
    pub precip_rate: Option<f64>,
    /// Running total reported by the station since local midnight
    pub precip_total_to_date: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_gust_time: Option<DateTime<Utc>>,
}

impl ObservationPoint {
    /// A point with only its timestamp set.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: None,
            temperature_min: None,
            temperature_max: None,
            humidity: None,
            pressure: None,
            pressure_min: None,
            pressure_max: None,
            precip_amount: 0.0,
            precip_rate: None,
            precip_total_to_date: None,
            wind_gust: None,
            wind_gust_time: None,
        }
    }
}

/// Latest station reading, as handed over by the fetch layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentObservation {
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_direction_degrees: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_total_to_date: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonInfo {
    /// Either a [0,1] cycle fraction or an angle in degrees
    pub phase_value: Option<f64>,
    #[serde(default)]
    pub phase_emoji: Option<String>,
    #[serde(default)]
    pub phase_key: Option<String>,
}

/// Short-horizon change of one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub delta: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesTrends {
    pub temperature: TrendResult,
    pub humidity: TrendResult,
    pub pressure: TrendResult,
}

/// Running min/max of one metric with the time each was first reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtremesResult {
    pub min_value: Option<f64>,
    pub min_time: Option<DateTime<Utc>>,
    pub max_value: Option<f64>,
    pub max_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesExtremes {
    pub temperature: ExtremesResult,
    pub humidity: ExtremesResult,
    pub pressure: ExtremesResult,
}

/// A contiguous run of positive rain-rate samples at the tail of a series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationEvent {
    pub is_active: bool,
    pub duration_hours: f64,
    pub accumulated_mm: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakGust {
    pub value: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Precipitation total and peak gust over a trailing calendar-day window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowAccumulation {
    pub total_mm: Option<f64>,
    pub peak_gust: PeakGust,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationWindows {
    pub day: WindowAccumulation,
    pub week: WindowAccumulation,
    pub month: WindowAccumulation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrecipitationSummary {
    pub event: PrecipitationEvent,
    pub since_midnight: Option<f64>,
    pub windows: PrecipitationWindows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DayPeriod {
    BeforeSunrise,
    Morning,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunState {
    /// Always within [0, 100]
    pub progress_percent: f64,
    pub period: DayPeriod,
    /// Daylight duration as `<H>h<MM>`
    pub day_length_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoonDirection {
    Waxing,
    Waning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoonState {
    pub cycle_progress_percent: Option<f64>,
    pub phase_direction: Option<MoonDirection>,
    pub next_full_moon: DateTime<Utc>,
    pub next_new_moon: DateTime<Utc>,
}

/// One row of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time_ms: i64,
    pub temperature: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_max: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub precip_rate: Option<f64>,
    pub precip_amount: f64,
    pub precip_cumulative: f64,
}

/// Axis scale starting at 0 with evenly spaced round ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickScale {
    pub domain: (f64, f64),
    pub ticks: Vec<f64>,
}

/// Hourly forecast entry, in the display timezone's wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastHour {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub weather_code: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Minimum for the morning, maximum for the afternoon
    pub temperature: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub weather_code: Option<i32>,
    pub condition: Option<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub morning: PeriodSummary,
    pub afternoon: PeriodSummary,
}
