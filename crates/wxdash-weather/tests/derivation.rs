//! End-to-end checks of the derivation pipeline over raw station records.

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};
use wxdash_weather::astro::{day_progress_percent, day_period, moon_state, normalize_phase_degrees};
use wxdash_weather::extremes::series_extremes;
use wxdash_weather::precipitation::{precipitation_event, precipitation_summary, window_accumulation};
use wxdash_weather::trend::{series_trends, trend};
use wxdash_weather::{
    build_chart_series, derive, normalize, tick_scale, ChartRange, DayPeriod, FieldMapping,
    MoonDirection, MoonInfo, ObservationPoint, SunTimes, WeatherInputs,
};

fn paris() -> Tz {
    "Europe/Paris".parse().unwrap()
}

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn hourly_records(rates: &[f64]) -> Vec<Value> {
    rates
        .iter()
        .enumerate()
        .map(|(i, rate)| {
            json!({
                "timestamp": (base() + Duration::hours(i as i64)).to_rfc3339(),
                "temperature": 10.0 + i as f64,
                "precipRate": rate,
            })
        })
        .collect()
}

#[test]
fn test_normalizer_drops_invalid_timestamps() {
    let records = vec![
        json!({"timestamp": "2024-05-01T10:00:00Z", "temperature": 11}),
        json!({"timestamp": "yesterday-ish", "temperature": 12}),
        json!({"temperature": 13}),
        json!({"timestamp": 1714561200, "temperature": "14.5"}),
    ];
    let points = normalize(&records, &FieldMapping::hourly(), Tz::UTC);
    assert_eq!(points.len(), records.len() - 2);
}

#[test]
fn test_normalized_series_is_ascending() {
    let records = vec![
        json!({"timestamp": "2024-05-01T12:00:00Z"}),
        json!({"timestamp": "2024-05-01T09:00:00Z"}),
        json!({"timestamp": "2024-05-01 11:00", "temperature": "NaN"}),
        json!({"timestamp": "2024-05-01T09:00:00Z", "temperature": 99}),
        json!({"timestamp": 1714550400000_i64}),
    ];
    let points = normalize(&records, &FieldMapping::hourly(), paris());
    assert!(points.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    // later records at 09:00 UTC are dropped
    assert!(points.iter().all(|p| p.temperature != Some(99.0)));
}

#[test]
fn test_trend_reference_is_one_hour_back() {
    let points = normalize(&hourly_records(&[0.0; 4]), &FieldMapping::hourly(), Tz::UTC);
    let result = trend(&points, |p| p.temperature);
    assert_eq!(result.delta, Some(13.0 - 12.0));
}

#[test]
fn test_extremes_keep_first_occurrence() {
    let points: Vec<ObservationPoint> = [5.0, 5.0, 3.0, 5.0]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let mut p = ObservationPoint::at(base() + Duration::hours(i as i64));
            p.temperature = Some(*v);
            p
        })
        .collect();
    let extremes = series_extremes(&points).temperature;
    assert_eq!(extremes.max_value, Some(5.0));
    assert_eq!(extremes.max_time, Some(base()));
    assert_eq!(extremes.min_time, Some(base() + Duration::hours(2)));
}

#[test]
fn test_precipitation_event_boundary() {
    let points = normalize(
        &hourly_records(&[0.0, 0.0, 2.0, 3.0, 1.0, 0.0]),
        &FieldMapping::hourly(),
        Tz::UTC,
    );
    let event = precipitation_event(&points);
    assert!(!event.is_active);
    assert!((event.accumulated_mm - 6.0).abs() < 1e-9);
    assert!((event.duration_hours - 4.0).abs() < 1e-9);
}

#[test]
fn test_window_accumulation_over_ten_days() {
    let tz = paris();
    let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 0, 0).unwrap();
    let records: Vec<Value> = (1..=10)
        .map(|day| json!({"date": format!("2024-05-{:02}", day), "precipTotal": 1.0}))
        .collect();
    let daily = normalize(&records, &FieldMapping::daily(), tz);
    assert_eq!(daily.len(), 10);

    assert_eq!(window_accumulation(&daily, now, tz, 7).total_mm, Some(7.0));
    assert_eq!(window_accumulation(&daily, now, tz, 30).total_mm, Some(10.0));

    let summary = precipitation_summary(&[], &daily, now, tz);
    assert_eq!(summary.windows.day.total_mm, Some(1.0));
    assert_eq!(summary.since_midnight, None);
}

#[test]
fn test_sun_progress_boundaries() {
    let sun = SunTimes {
        sunrise: Utc.with_ymd_and_hms(2024, 5, 1, 4, 30, 0).unwrap(),
        sunset: Utc.with_ymd_and_hms(2024, 5, 1, 19, 10, 0).unwrap(),
    };
    assert_eq!(day_progress_percent(&sun, sun.sunrise), 0.0);
    assert_eq!(day_progress_percent(&sun, sun.sunset), 100.0);
    assert_eq!(
        day_period(&sun, sun.sunrise - Duration::minutes(1), paris()),
        DayPeriod::BeforeSunrise
    );
}

#[test]
fn test_moon_normalization() {
    let degrees = normalize_phase_degrees(Some(0.5));
    assert_eq!(degrees, Some(180.0));

    let info = MoonInfo {
        phase_value: Some(0.5),
        phase_emoji: None,
        phase_key: None,
    };
    let state = moon_state(Some(&info), base());
    assert_eq!(state.cycle_progress_percent, Some(50.0));
    assert_eq!(state.phase_direction, Some(MoonDirection::Waning));

    let waxing = MoonInfo {
        phase_value: Some(179.999),
        ..info
    };
    assert_eq!(
        moon_state(Some(&waxing), base()).phase_direction,
        Some(MoonDirection::Waxing)
    );
}

#[test]
fn test_tick_scale_nice_numbers() {
    let scale = tick_scale(23.0);
    assert_eq!(scale.ticks, vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0]);
    assert_eq!(scale.domain, (0.0, 25.0));
}

#[test]
fn test_cumulative_precipitation_never_decreases() {
    let records: Vec<Value> = [0.0, 2.0, -1.0, 0.5, f64::NAN, 4.0]
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            let amount = if amount.is_finite() {
                json!(amount)
            } else {
                json!("NaN")
            };
            json!({
                "timestamp": (base() + Duration::hours(i as i64)).to_rfc3339(),
                "precipAmount": amount,
            })
        })
        .collect();

    for range in [ChartRange::Day, ChartRange::SevenDays] {
        let series = build_chart_series(range, &records, Tz::UTC);
        assert_eq!(series.len(), 6);
        assert!(series
            .windows(2)
            .all(|w| w[0].precip_cumulative <= w[1].precip_cumulative));
        assert_eq!(series.last().map(|p| p.precip_cumulative), Some(6.5));
    }
}

#[test]
fn test_empty_input_gives_no_data() {
    let now = base();
    assert!(normalize(&[], &FieldMapping::daily(), Tz::UTC).is_empty());
    assert_eq!(series_trends(&[]).temperature.delta, None);
    assert_eq!(series_extremes(&[]).pressure.max_value, None);
    assert!(!precipitation_event(&[]).is_active);
    assert!(build_chart_series(ChartRange::ThirtyDays, &[], Tz::UTC).is_empty());

    let derived = derive(&WeatherInputs::default(), now, paris());
    assert_eq!(derived.sun.progress_percent, 0.0);
    assert_eq!(derived.moon.phase_direction, None);
    assert_eq!(derived.precipitation.windows.month.total_mm, None);
}

#[test]
fn test_full_pipeline_from_raw_records() {
    let tz = paris();
    let hourly = normalize(
        &hourly_records(&[0.0, 0.0, 1.0, 1.5]),
        &FieldMapping::hourly(),
        tz,
    );
    let now = hourly.last().map(|p| p.timestamp).unwrap();
    let inputs = WeatherInputs {
        hourly,
        sun: Some(SunTimes {
            sunrise: now - Duration::hours(6),
            sunset: now + Duration::hours(6),
        }),
        ..Default::default()
    };

    let derived = derive(&inputs, now, tz);
    assert!(derived.precipitation.event.is_active);
    assert!((derived.precipitation.event.accumulated_mm - 2.5).abs() < 1e-9);
    assert_eq!(derived.trends.temperature.delta, Some(1.0));
    assert_eq!(derived.extremes.temperature.max_value, Some(13.0));
    assert!((derived.sun.progress_percent - 50.0).abs() < 1e-9);
    let day_chart = derived.chart(ChartRange::Day).unwrap();
    assert_eq!(day_chart.points.len(), 4);
}
