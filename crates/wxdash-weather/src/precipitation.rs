//! Rain events and trailing-window accumulations.
//!
//! "Is it raining" is decided from the last sample of the hourly series
//! only; the current-observation rate is not consulted.

use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::types::{
    ObservationPoint, PeakGust, PrecipitationEvent, PrecipitationSummary, PrecipitationWindows,
    WindowAccumulation,
};

/// Sampling interval assumed when a run has no neighbouring sample.
const DEFAULT_INTERVAL_HOURS: f64 = 5.0 / 60.0;

fn rate_at(points: &[ObservationPoint], i: usize) -> f64 {
    points[i]
        .precip_rate
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
}

fn hours_between(earlier: &ObservationPoint, later: &ObservationPoint) -> f64 {
    (later.timestamp - earlier.timestamp).num_milliseconds() as f64 / 3_600_000.0
}

/// The most recent run of positive rain rates.
///
/// The run normally ends at the last sample. If the last sample is dry but
/// the one before it is wet, the run ending there is still reported (with
/// `is_active == false`) so a shower that just stopped keeps its totals.
///
/// Each sample stands for the interval leading up to it, so a sample's
/// covered time is its gap to the previous sample, and the duration gets one
/// extra interval on top.
pub fn precipitation_event(points: &[ObservationPoint]) -> PrecipitationEvent {
    let Some(last) = points.len().checked_sub(1) else {
        return PrecipitationEvent::default();
    };

    let is_active = rate_at(points, last) > 0.0;
    let end = if is_active {
        last
    } else if last >= 1 && rate_at(points, last - 1) > 0.0 {
        last - 1
    } else {
        return PrecipitationEvent::default();
    };

    let mut start = end;
    while start > 0 && rate_at(points, start - 1) > 0.0 {
        start -= 1;
    }

    let interval = inferred_interval_hours(points, start, end);

    let mut duration_hours = 0.0;
    let mut accumulated_mm = 0.0;
    for i in start..=end {
        let covered = if i == 0 {
            interval
        } else {
            hours_between(&points[i - 1], &points[i])
        };
        duration_hours += covered;
        accumulated_mm += rate_at(points, i) * covered;
    }
    duration_hours += interval;

    PrecipitationEvent {
        is_active,
        duration_hours,
        accumulated_mm,
    }
}

/// Gap to the sample before the run, else after it, else the default.
fn inferred_interval_hours(points: &[ObservationPoint], start: usize, end: usize) -> f64 {
    let gap = if start > 0 {
        Some(hours_between(&points[start - 1], &points[start]))
    } else if end + 1 < points.len() {
        Some(hours_between(&points[end], &points[end + 1]))
    } else {
        None
    };
    gap.filter(|g| *g > 0.0).unwrap_or(DEFAULT_INTERVAL_HOURS)
}

/// Calendar date of `instant` in the display timezone.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Rain since local midnight, from the station's running daily total.
///
/// Running totals only grow within a day, but the max also survives a
/// counter reset or out-of-order samples.
pub fn since_midnight(points: &[ObservationPoint], now: DateTime<Utc>, tz: Tz) -> Option<f64> {
    let today = local_date(now, tz);
    points
        .iter()
        .filter(|p| local_date(p.timestamp, tz) == today)
        .filter_map(|p| p.precip_total_to_date)
        .fold(None, |best: Option<f64>, v| Some(best.map_or(v, |b| b.max(v))))
}

/// Total rain and peak gust over the `days` local calendar days ending today.
///
/// The window starts at local midnight today minus `days - 1` days; every
/// daily record whose local day starts on or after that boundary counts.
pub fn window_accumulation(
    daily: &[ObservationPoint],
    now: DateTime<Utc>,
    tz: Tz,
    days: u32,
) -> WindowAccumulation {
    let today = local_date(now, tz);
    let window_start = today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);

    let mut total: Option<f64> = None;
    let mut peak = PeakGust::default();

    for p in daily.iter().filter(|p| local_date(p.timestamp, tz) >= window_start) {
        total = Some(total.unwrap_or(0.0) + p.precip_amount);

        if let Some(gust) = p.wind_gust.filter(|g| g.is_finite()) {
            if peak.value.map_or(true, |best| gust > best) {
                peak.value = Some(gust);
                peak.timestamp = p.wind_gust_time.or(Some(p.timestamp));
            }
        }
    }

    WindowAccumulation {
        total_mm: total,
        peak_gust: peak,
    }
}

pub fn precipitation_windows(
    daily: &[ObservationPoint],
    now: DateTime<Utc>,
    tz: Tz,
) -> PrecipitationWindows {
    PrecipitationWindows {
        day: window_accumulation(daily, now, tz, 1),
        week: window_accumulation(daily, now, tz, 7),
        month: window_accumulation(daily, now, tz, 30),
    }
}

/// Everything the rain card needs.
pub fn precipitation_summary(
    hourly: &[ObservationPoint],
    daily: &[ObservationPoint],
    now: DateTime<Utc>,
    tz: Tz,
) -> PrecipitationSummary {
    PrecipitationSummary {
        event: precipitation_event(hourly),
        since_midnight: since_midnight(hourly, now, tz),
        windows: precipitation_windows(daily, now, tz),
    }
}
