//! One-hour trends ("+1.2° since an hour ago").

use crate::types::{ObservationPoint, SeriesTrends, TrendResult};

/// Accepted gap, in hours, between the latest sample and its reference.
/// Station intervals drift, so "an hour ago" is any sample 54–66 minutes back.
const REFERENCE_WINDOW_HOURS: (f64, f64) = (0.9, 1.1);

/// Delta between the latest value of a metric and its value about an hour earlier.
///
/// The reference is the latest earlier sample whose gap to the last one lies
/// within [0.9h, 1.1h]; if none does, the immediately preceding sample is used.
/// Both values must be present, otherwise the delta is `None`.
pub fn trend<F>(points: &[ObservationPoint], metric: F) -> TrendResult
where
    F: Fn(&ObservationPoint) -> Option<f64>,
{
    let Some((last, earlier)) = points.split_last() else {
        return TrendResult::default();
    };
    let Some(previous) = earlier.last() else {
        return TrendResult::default();
    };

    let (lo, hi) = REFERENCE_WINDOW_HOURS;
    let reference = earlier
        .iter()
        .rev()
        .find(|p| {
            let gap = hours_between(p, last);
            (lo..=hi).contains(&gap)
        })
        .unwrap_or(previous);

    let delta = match (metric(last), metric(reference)) {
        (Some(now), Some(then)) if now.is_finite() && then.is_finite() => Some(now - then),
        _ => None,
    };
    TrendResult { delta }
}

/// Trends for the three metrics shown on the dashboard cards.
pub fn series_trends(points: &[ObservationPoint]) -> SeriesTrends {
    SeriesTrends {
        temperature: trend(points, |p| p.temperature),
        humidity: trend(points, |p| p.humidity),
        pressure: trend(points, |p| p.pressure),
    }
}

fn hours_between(earlier: &ObservationPoint, later: &ObservationPoint) -> f64 {
    (later.timestamp - earlier.timestamp).num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn point(minutes: i64, temperature: Option<f64>) -> ObservationPoint {
        let mut p = ObservationPoint::at(base() + Duration::minutes(minutes));
        p.temperature = temperature;
        p
    }

    #[test]
    fn test_empty_and_single_are_none() {
        assert_eq!(trend(&[], |p| p.temperature).delta, None);
        assert_eq!(trend(&[point(0, Some(1.0))], |p| p.temperature).delta, None);
    }

    #[test]
    fn test_picks_sample_about_an_hour_back() {
        // 10-minute cadence: the 60-minute-old sample must win over the previous one
        let points: Vec<_> = (0..=6).map(|i| point(i * 10, Some(i as f64))).collect();
        assert_eq!(trend(&points, |p| p.temperature).delta, Some(6.0));
    }

    #[test]
    fn test_tolerates_irregular_gap() {
        let points = vec![point(0, Some(10.0)), point(64, Some(11.0)), point(120, Some(13.5))];
        // 120 - 64 = 56 minutes, inside the window
        assert_eq!(trend(&points, |p| p.temperature).delta, Some(2.5));
    }

    #[test]
    fn test_window_edges_are_inclusive() {
        for edge in [54, 66] {
            let points = vec![
                point(0, Some(10.0)),
                point(30, Some(20.0)),
                point(edge, Some(13.0)),
            ];
            assert_eq!(
                trend(&points, |p| p.temperature).delta,
                Some(3.0),
                "{} min",
                edge
            );
        }

        // just outside: previous sample is used
        let points = vec![
            point(0, Some(10.0)),
            point(30, Some(20.0)),
            point(67, Some(13.0)),
        ];
        assert_eq!(trend(&points, |p| p.temperature).delta, Some(-7.0));
    }

    #[test]
    fn test_falls_back_to_previous_sample() {
        let points = vec![point(0, Some(10.0)), point(180, Some(12.0)), point(360, Some(15.0))];
        assert_eq!(trend(&points, |p| p.temperature).delta, Some(3.0));
    }

    #[test]
    fn test_missing_reference_value_is_none() {
        let points = vec![point(0, Some(10.0)), point(60, None), point(120, Some(12.0))];
        assert_eq!(trend(&points, |p| p.temperature).delta, None);
    }

    #[test]
    fn test_series_trends_per_metric() {
        let mut a = point(0, Some(10.0));
        a.pressure = Some(1012.0);
        let mut b = point(60, Some(11.0));
        b.pressure = Some(1010.5);
        let trends = series_trends(&[a, b]);
        assert_eq!(trends.temperature.delta, Some(1.0));
        assert_eq!(trends.pressure.delta, Some(-1.5));
        assert_eq!(trends.humidity.delta, None);
    }
}
