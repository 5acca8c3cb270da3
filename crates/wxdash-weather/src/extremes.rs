//! Min/max tracking with the time each extreme was first reached.

use chrono::{DateTime, Utc};

use crate::types::{ExtremesResult, ObservationPoint, SeriesExtremes};

impl ExtremesResult {
    /// Fold a candidate into both the running min and max.
    fn observe(&mut self, value: Option<f64>, time: DateTime<Utc>) {
        self.observe_min(value, time);
        self.observe_max(value, time);
    }

    /// Strict `<`: a later equal value never replaces the first one.
    fn observe_min(&mut self, value: Option<f64>, time: DateTime<Utc>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        if self.min_value.map_or(true, |current| value < current) {
            self.min_value = Some(value);
            self.min_time = Some(time);
        }
    }

    fn observe_max(&mut self, value: Option<f64>, time: DateTime<Utc>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        if self.max_value.map_or(true, |current| value > current) {
            self.max_value = Some(value);
            self.max_time = Some(time);
        }
    }
}

/// Single pass over an ascending series.
///
/// Temperature and pressure also take their explicit `_min`/`_max`
/// sub-fields into account, so a daily summary row contributes its true
/// low and high rather than just its average.
pub fn series_extremes(points: &[ObservationPoint]) -> SeriesExtremes {
    let mut extremes = SeriesExtremes::default();

    for p in points {
        let t = p.timestamp;

        extremes.temperature.observe(p.temperature, t);
        extremes.temperature.observe_min(p.temperature_min, t);
        extremes.temperature.observe_max(p.temperature_max, t);

        extremes.humidity.observe(p.humidity, t);

        extremes.pressure.observe(p.pressure, t);
        extremes.pressure.observe_min(p.pressure_min, t);
        extremes.pressure.observe_max(p.pressure_max, t);
    }

    extremes
}
