//! Sun and moon cycle progress.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;

use crate::types::{DayPeriod, MoonDirection, MoonInfo, MoonState, SunState, SunTimes};

/// Mean length of a lunation, in days.
pub const SYNODIC_MONTH_DAYS: f64 = 29.530588853;

/// 2000-01-06 18:14 UTC, a known new moon.
const REFERENCE_NEW_MOON_UNIX: i64 = 947_182_440;

const MORNING_ENDS_HOUR: u32 = 12;
const AFTERNOON_ENDS_HOUR: u32 = 17;

/// Day progress and period for `now`.
///
/// Without sun times the card shows an empty bar and "night".
pub fn sun_state(sun: Option<&SunTimes>, now: DateTime<Utc>, tz: Tz) -> SunState {
    let Some(sun) = sun else {
        return SunState {
            progress_percent: 0.0,
            period: DayPeriod::Night,
            day_length_label: None,
        };
    };

    SunState {
        progress_percent: day_progress_percent(sun, now),
        period: day_period(sun, now, tz),
        day_length_label: Some(day_length_label(sun)),
    }
}

/// Percent of daylight elapsed, clamped to [0, 100]. Zero for a degenerate day.
pub fn day_progress_percent(sun: &SunTimes, now: DateTime<Utc>) -> f64 {
    let span = (sun.sunset - sun.sunrise).num_milliseconds();
    if span <= 0 {
        return 0.0;
    }
    let elapsed = (now - sun.sunrise).num_milliseconds() as f64;
    (elapsed / span as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn day_period(sun: &SunTimes, now: DateTime<Utc>, tz: Tz) -> DayPeriod {
    if now < sun.sunrise {
        return DayPeriod::BeforeSunrise;
    }
    if now >= sun.sunset {
        return DayPeriod::Night;
    }
    match now.with_timezone(&tz).hour() {
        h if h < MORNING_ENDS_HOUR => DayPeriod::Morning,
        h if h < AFTERNOON_ENDS_HOUR => DayPeriod::Afternoon,
        _ => DayPeriod::Evening,
    }
}

/// Daylight duration formatted as `9h05`.
pub fn day_length_label(sun: &SunTimes) -> String {
    let minutes = (sun.sunset - sun.sunrise).num_minutes().max(0);
    format!("{}h{:02}", minutes / 60, minutes % 60)
}

/// Map a reported phase onto degrees in [0, 360).
///
/// Values up to 1 are a cycle fraction; anything larger is already degrees
/// and may wrap. Missing or non-finite input yields `None`.
pub fn normalize_phase_degrees(raw: Option<f64>) -> Option<f64> {
    let raw = raw.filter(|v| v.is_finite())?;
    let degrees = if raw <= 1.0 { raw * 360.0 } else { raw };
    Some(((degrees % 360.0) + 360.0) % 360.0)
}

pub fn moon_direction(degrees: f64) -> MoonDirection {
    if degrees < 180.0 {
        MoonDirection::Waxing
    } else {
        MoonDirection::Waning
    }
}

/// Moon card state. Cycle progress follows the station's reported phase;
/// the next-phase dates are computed from the date alone.
pub fn moon_state(info: Option<&MoonInfo>, now: DateTime<Utc>) -> MoonState {
    let degrees = normalize_phase_degrees(info.and_then(|i| i.phase_value));

    MoonState {
        cycle_progress_percent: degrees.map(|d| d / 360.0 * 100.0),
        phase_direction: degrees.map(moon_direction),
        next_full_moon: next_full_moon(now),
        next_new_moon: next_new_moon(now),
    }
}

/// Days since the last new moon, in [0, SYNODIC_MONTH_DAYS).
pub fn lunar_age_days(now: DateTime<Utc>) -> f64 {
    let seconds = (now.timestamp() - REFERENCE_NEW_MOON_UNIX) as f64
        + f64::from(now.timestamp_subsec_millis()) / 1000.0;
    (seconds / 86_400.0).rem_euclid(SYNODIC_MONTH_DAYS)
}

/// First new moon strictly after `now`.
pub fn next_new_moon(now: DateTime<Utc>) -> DateTime<Utc> {
    now + days_to_duration(SYNODIC_MONTH_DAYS - lunar_age_days(now))
}

/// First full moon after `now` (a full moon happening right now counts).
pub fn next_full_moon(now: DateTime<Utc>) -> DateTime<Utc> {
    let half = SYNODIC_MONTH_DAYS / 2.0;
    let age = lunar_age_days(now);
    let wait = if age <= half {
        half - age
    } else {
        SYNODIC_MONTH_DAYS - age + half
    };
    now + days_to_duration(wait)
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * 86_400_000.0).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sun() -> SunTimes {
        SunTimes {
            sunrise: Utc.with_ymd_and_hms(2024, 6, 21, 4, 0, 0).unwrap(),
            sunset: Utc.with_ymd_and_hms(2024, 6, 21, 20, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_progress_boundaries() {
        let s = sun();
        assert_eq!(day_progress_percent(&s, s.sunrise), 0.0);
        assert_eq!(day_progress_percent(&s, s.sunset), 100.0);
        assert_eq!(day_progress_percent(&s, s.sunset + Duration::hours(2)), 100.0);
        assert_eq!(day_progress_percent(&s, s.sunrise - Duration::hours(2)), 0.0);
    }

    #[test]
    fn test_degenerate_day_is_zero() {
        let t = Utc.with_ymd_and_hms(2024, 12, 21, 12, 0, 0).unwrap();
        let s = SunTimes { sunrise: t, sunset: t };
        assert_eq!(day_progress_percent(&s, t), 0.0);
    }

    #[test]
    fn test_periods_use_display_timezone() {
        let s = sun();
        let tz = Tz::UTC;
        let at = |h| Utc.with_ymd_and_hms(2024, 6, 21, h, 0, 0).unwrap();
        assert_eq!(day_period(&s, at(3), tz), DayPeriod::BeforeSunrise);
        assert_eq!(day_period(&s, at(9), tz), DayPeriod::Morning);
        assert_eq!(day_period(&s, at(12), tz), DayPeriod::Afternoon);
        assert_eq!(day_period(&s, at(17), tz), DayPeriod::Evening);
        assert_eq!(day_period(&s, at(21), tz), DayPeriod::Night);

        // 10:00 UTC is noon in Paris (CEST)
        let paris: Tz = "Europe/Paris".parse().unwrap();
        assert_eq!(day_period(&s, at(10), paris), DayPeriod::Afternoon);
    }

    #[test]
    fn test_day_length_label() {
        assert_eq!(day_length_label(&sun()), "16h05");
    }

    #[test]
    fn test_missing_sun_data() {
        let state = sun_state(None, Utc::now(), Tz::UTC);
        assert_eq!(state.progress_percent, 0.0);
        assert_eq!(state.period, DayPeriod::Night);
        assert_eq!(state.day_length_label, None);
    }

    #[test]
    fn test_phase_normalization() {
        assert_eq!(normalize_phase_degrees(Some(0.5)), Some(180.0));
        assert_eq!(normalize_phase_degrees(Some(0.25)), Some(90.0));
        assert_eq!(normalize_phase_degrees(Some(450.0)), Some(90.0));
        assert_eq!(normalize_phase_degrees(Some(-0.25)), Some(270.0));
        assert_eq!(normalize_phase_degrees(Some(f64::NAN)), None);
        assert_eq!(normalize_phase_degrees(None), None);
    }

    #[test]
    fn test_direction_boundary() {
        assert_eq!(moon_direction(179.999), MoonDirection::Waxing);
        assert_eq!(moon_direction(180.0), MoonDirection::Waning);
    }

    #[test]
    fn test_next_phases_from_known_dates() {
        // New moon on 2024-01-11 11:57 UTC; full moon on 2024-01-25 17:54 UTC
        let now = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let new = next_new_moon(now);
        let full = next_full_moon(now);
        let expected_new = Utc.with_ymd_and_hms(2024, 1, 11, 11, 57, 0).unwrap();
        let expected_full = Utc.with_ymd_and_hms(2024, 1, 25, 17, 54, 0).unwrap();
        // mean-lunation approximation, within a day
        assert!((new - expected_new).num_hours().abs() < 24);
        assert!((full - expected_full).num_hours().abs() < 24);
    }

    #[test]
    fn test_next_phases_are_in_the_future() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap();
        let new = next_new_moon(now);
        let full = next_full_moon(now);
        assert!(new > now && new <= now + Duration::days(30));
        assert!(full >= now && full <= now + Duration::days(30));
    }
}
