//! Turns raw JSON records from the station feeds into ascending
//! [`ObservationPoint`] series.
//!
//! Bad records never fail the whole series: a record without a usable
//! timestamp is dropped, and a field that doesn't coerce to a finite
//! number is treated as absent.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::types::ObservationPoint;

/// Epoch values below this are seconds, above it milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Source key for each canonical field. `None` means the feed never carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub timestamp: &'static str,
    pub temperature: Option<&'static str>,
    pub temperature_min: Option<&'static str>,
    pub temperature_max: Option<&'static str>,
    pub humidity: Option<&'static str>,
    pub pressure: Option<&'static str>,
    pub pressure_min: Option<&'static str>,
    pub pressure_max: Option<&'static str>,
    pub precip_amount: Option<&'static str>,
    pub precip_rate: Option<&'static str>,
    pub precip_total_to_date: Option<&'static str>,
    pub wind_gust: Option<&'static str>,
    pub wind_gust_time: Option<&'static str>,
}

impl FieldMapping {
    /// Last-24h hourly series, full observation shape.
    pub fn hourly() -> Self {
        Self {
            timestamp: "timestamp",
            temperature: Some("temperature"),
            temperature_min: Some("temperatureMin"),
            temperature_max: Some("temperatureMax"),
            humidity: Some("humidity"),
            pressure: Some("pressure"),
            pressure_min: Some("pressureMin"),
            pressure_max: Some("pressureMax"),
            precip_amount: Some("precipAmount"),
            precip_rate: Some("precipRate"),
            precip_total_to_date: Some("precipTotalToDate"),
            wind_gust: Some("windGust"),
            wind_gust_time: Some("windGustTimestamp"),
        }
    }

    /// 7-day hourly series. Same keys as [`FieldMapping::hourly`]; the feed
    /// simply leaves most of them out.
    pub fn seven_day() -> Self {
        Self::hourly()
    }

    /// Daily history summaries (up to 30 days).
    pub fn daily() -> Self {
        Self {
            timestamp: "date",
            temperature: Some("temperatureMean"),
            temperature_min: Some("temperatureLow"),
            temperature_max: Some("temperatureHigh"),
            humidity: Some("humidityAvg"),
            pressure: Some("pressureAvg"),
            pressure_min: Some("pressureMin"),
            pressure_max: Some("pressureMax"),
            precip_amount: Some("precipTotal"),
            precip_rate: None,
            precip_total_to_date: None,
            wind_gust: Some("gustHigh"),
            wind_gust_time: Some("gustHighTime"),
        }
    }
}

/// Normalize a batch of raw records into a strictly ascending series.
///
/// Naive (offset-less) timestamps are read as wall-clock time in `tz`.
/// When two records share a timestamp the first one in input order wins.
pub fn normalize(records: &[Value], mapping: &FieldMapping, tz: Tz) -> Vec<ObservationPoint> {
    let mut points: Vec<ObservationPoint> = records
        .iter()
        .filter_map(|record| normalize_record(record, mapping, tz))
        .collect();

    let dropped = records.len() - points.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} records with unusable timestamps", dropped);
    }

    // Stable sort keeps input order among equal timestamps, so dedup keeps the first.
    points.sort_by_key(|p| p.timestamp);
    let before = points.len();
    points.dedup_by_key(|p| p.timestamp);
    if points.len() < before {
        tracing::debug!("Dropped {} duplicate timestamps", before - points.len());
    }

    points
}

/// Normalize a single record; `None` if its timestamp can't be read.
pub fn normalize_record(
    record: &Value,
    mapping: &FieldMapping,
    tz: Tz,
) -> Option<ObservationPoint> {
    let timestamp = record
        .get(mapping.timestamp)
        .and_then(|v| parse_timestamp(v, tz))?;

    let field = |key: Option<&'static str>| key.and_then(|k| coerce_number(record.get(k)));

    let temperature_min = field(mapping.temperature_min);
    let temperature_max = field(mapping.temperature_max);
    let pressure_min = field(mapping.pressure_min);
    let pressure_max = field(mapping.pressure_max);
    let wind_gust = field(mapping.wind_gust);

    let wind_gust_time = mapping
        .wind_gust_time
        .and_then(|k| record.get(k))
        .and_then(|v| parse_timestamp(v, tz))
        .or_else(|| wind_gust.map(|_| timestamp));

    Some(ObservationPoint {
        timestamp,
        temperature: representative(field(mapping.temperature), temperature_min, temperature_max),
        temperature_min,
        temperature_max,
        humidity: field(mapping.humidity),
        pressure: representative(field(mapping.pressure), pressure_min, pressure_max),
        pressure_min,
        pressure_max,
        precip_amount: field(mapping.precip_amount).unwrap_or(0.0),
        precip_rate: field(mapping.precip_rate),
        precip_total_to_date: field(mapping.precip_total_to_date),
        wind_gust,
        wind_gust_time,
    })
}

/// Prefer the reported mean; otherwise the midpoint of min and max.
fn representative(mean: Option<f64>, min: Option<f64>, max: Option<f64>) -> Option<f64> {
    match (mean, min, max) {
        (Some(mean), _, _) => Some(mean),
        (None, Some(lo), Some(hi)) => Some((lo + hi) / 2.0).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Coerce a JSON number or numeric string to a finite `f64`.
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Parse an RFC 3339 string, a naive local date-time, a bare date (local
/// midnight) or an epoch number (seconds or milliseconds).
pub fn parse_timestamp(value: &Value, tz: Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let raw = n.as_f64().filter(|v| v.is_finite())?;
            if raw.abs() < EPOCH_MILLIS_THRESHOLD {
                DateTime::from_timestamp(raw.trunc() as i64, 0)
            } else {
                DateTime::from_timestamp_millis(raw.trunc() as i64)
            }
        }
        Value::String(s) => parse_timestamp_str(s.trim(), tz),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_to_utc(naive, tz);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| local_to_utc(midnight, tz))
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times inside a DST gap are shifted forward by one hour.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
