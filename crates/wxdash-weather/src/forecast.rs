//! Day cards built from the hourly forecast.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Timelike};

use crate::types::{ForecastDay, ForecastHour, PeriodSummary, WeatherCondition};

pub const MAX_FORECAST_DAYS: usize = 16;

const MORNING_HOURS: std::ops::Range<u32> = 6..12;
const AFTERNOON_HOURS: std::ops::Range<u32> = 12..18;

#[derive(Clone, Copy)]
enum Period {
    Morning,
    Afternoon,
}

/// Group forecast hours into per-day morning and afternoon summaries.
///
/// A day is only kept when all 24 local hours are present and every one of
/// them has a temperature; partial first and last days are dropped.
pub fn aggregate_forecast(hours: &[ForecastHour]) -> Vec<ForecastDay> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&ForecastHour>> = BTreeMap::new();
    for hour in hours {
        by_day.entry(hour.time.date()).or_default().push(hour);
    }

    let days: Vec<ForecastDay> = by_day
        .into_iter()
        .filter(|(_, entries)| is_complete_day(entries))
        .map(|(date, entries)| ForecastDay {
            date,
            morning: summarize(&entries, Period::Morning),
            afternoon: summarize(&entries, Period::Afternoon),
        })
        .take(MAX_FORECAST_DAYS)
        .collect();

    tracing::debug!(
        "Aggregated {} forecast hours into {} days",
        hours.len(),
        days.len()
    );
    days
}

fn is_complete_day(entries: &[&ForecastHour]) -> bool {
    let distinct: BTreeSet<u32> = entries.iter().map(|h| h.time.hour()).collect();
    distinct.len() == 24
        && entries
            .iter()
            .all(|h| h.temperature.is_some_and(f64::is_finite))
}

fn summarize(entries: &[&ForecastHour], period: Period) -> PeriodSummary {
    let range = match period {
        Period::Morning => MORNING_HOURS,
        Period::Afternoon => AFTERNOON_HOURS,
    };
    let in_period: Vec<&ForecastHour> = entries
        .iter()
        .copied()
        .filter(|h| range.contains(&h.time.hour()))
        .collect();

    let temps = in_period.iter().filter_map(|h| h.temperature);
    let temperature = match period {
        Period::Morning => temps.reduce(f64::min),
        Period::Afternoon => temps.reduce(f64::max),
    };

    let precipitation_probability = in_period
        .iter()
        .filter_map(|h| h.precipitation_probability)
        .filter(|p| p.is_finite())
        .reduce(f64::max);

    let dominant = dominant_code(in_period.iter().filter_map(|h| h.weather_code));

    PeriodSummary {
        temperature,
        precipitation_probability,
        weather_code: dominant.map(|(_, code)| code),
        condition: dominant.map(|(condition, _)| condition),
    }
}

/// Most severe condition present, reported with the largest code in its category.
/// Codes outside the WMO table are ignored.
pub fn dominant_code(codes: impl IntoIterator<Item = i32>) -> Option<(WeatherCondition, i32)> {
    codes
        .into_iter()
        .filter_map(|code| WeatherCondition::from_wmo_code(code).map(|c| (c, code)))
        .max()
}
