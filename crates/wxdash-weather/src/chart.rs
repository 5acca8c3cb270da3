//! Chart-ready series and the "nice numbers" scale for the cumulative rain axis.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::{normalize, FieldMapping};
use crate::types::{ChartPoint, ObservationPoint, TickScale};

/// Roughly how many intervals the rain axis should show.
const TARGET_TICK_COUNT: f64 = 5.0;
const TICK_DECIMALS: i32 = 6;
const MIN_ROUNDED_STEP: f64 = 1e-6;
const MAX_TICK_COUNT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartRange {
    #[default]
    Day,
    SevenDays,
    ThirtyDays,
}

impl ChartRange {
    /// Field mapping of the feed backing this range.
    pub fn mapping(&self) -> FieldMapping {
        match self {
            ChartRange::Day => FieldMapping::hourly(),
            ChartRange::SevenDays => FieldMapping::seven_day(),
            ChartRange::ThirtyDays => FieldMapping::daily(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::Day => "24h",
            ChartRange::SevenDays => "7d",
            ChartRange::ThirtyDays => "30d",
        }
    }
}

/// Normalize a range's raw records and prepare them for plotting.
pub fn build_chart_series(range: ChartRange, records: &[Value], tz: Tz) -> Vec<ChartPoint> {
    prepare_chart_series(&normalize(records, &range.mapping(), tz))
}

/// Map an ascending series to chart rows with a running rain total.
///
/// The cumulative line runs across the whole window and is never reset at
/// day boundaries. Negative amounts are ignored so it can't go down.
pub fn prepare_chart_series(points: &[ObservationPoint]) -> Vec<ChartPoint> {
    let mut cumulative = 0.0;
    points
        .iter()
        .map(|p| {
            if p.precip_amount.is_finite() && p.precip_amount > 0.0 {
                cumulative += p.precip_amount;
            }
            ChartPoint {
                time_ms: p.timestamp.timestamp_millis(),
                temperature: p.temperature,
                temperature_min: p.temperature_min,
                temperature_max: p.temperature_max,
                humidity: p.humidity,
                pressure: p.pressure,
                precip_rate: p.precip_rate,
                precip_amount: p.precip_amount,
                precip_cumulative: cumulative,
            }
        })
        .collect()
}

/// Scale for a 0-based axis that covers `max` with 1/2/5×10ⁿ steps.
///
/// The top tick is always strictly above `max`, so the highest point never
/// sits on the edge of the plot.
pub fn tick_scale(max: f64) -> TickScale {
    if !max.is_finite() || max <= 0.0 {
        return TickScale {
            domain: (0.0, 1.0),
            ticks: vec![0.0, 1.0],
        };
    }

    let step = nice_step(max / TARGET_TICK_COUNT);
    // steps finer than the rounding precision keep their exact values
    let tidy = |value: f64| {
        if step >= MIN_ROUNDED_STEP {
            round_to(value, TICK_DECIMALS)
        } else {
            value
        }
    };

    let mut upper = tidy((max / step).ceil() * step);
    if upper <= tidy(max) {
        upper = tidy(upper + step);
    }
    if !upper.is_finite() {
        upper = f64::MAX;
    }

    let count = ((upper / step).round() as usize).min(MAX_TICK_COUNT);
    let mut ticks: Vec<f64> = (0..=count)
        .map(|i| tidy(i as f64 * step))
        .filter(|tick| *tick <= upper)
        .collect();
    ticks.dedup();

    TickScale {
        domain: (0.0, upper),
        ticks,
    }
}

/// Scale for the cumulative rain line of a prepared series.
pub fn cumulative_tick_scale(points: &[ChartPoint]) -> TickScale {
    let max = points
        .iter()
        .map(|p| p.precip_cumulative)
        .fold(0.0_f64, f64::max);
    tick_scale(max)
}

fn nice_step(raw_step: f64) -> f64 {
    let magnitude = 10_f64.powf(raw_step.log10().floor());
    let residual = raw_step / magnitude;
    let factor = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / scale
}
