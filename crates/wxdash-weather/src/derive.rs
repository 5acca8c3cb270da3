//! One call from fetched inputs to everything the dashboard shows.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::astro::{moon_state, sun_state};
use crate::chart::{cumulative_tick_scale, prepare_chart_series, ChartRange};
use crate::extremes::series_extremes;
use crate::forecast::aggregate_forecast;
use crate::precipitation::precipitation_summary;
use crate::trend::series_trends;
use crate::types::{
    ChartPoint, CurrentObservation, ForecastDay, ForecastHour, MoonInfo, MoonState,
    ObservationPoint, PrecipitationSummary, SeriesExtremes, SeriesTrends, SunState, SunTimes,
    TickScale,
};

/// Normalized inputs of one refresh cycle.
#[derive(Debug, Clone, Default)]
pub struct WeatherInputs {
    pub current: Option<CurrentObservation>,
    pub hourly: Vec<ObservationPoint>,
    pub week: Vec<ObservationPoint>,
    pub daily: Vec<ObservationPoint>,
    pub sun: Option<SunTimes>,
    pub moon: Option<MoonInfo>,
    pub forecast: Vec<ForecastHour>,
}

impl WeatherInputs {
    pub fn series(&self, range: ChartRange) -> &[ObservationPoint] {
        match range {
            ChartRange::Day => &self.hourly,
            ChartRange::SevenDays => &self.week,
            ChartRange::ThirtyDays => &self.daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub range: ChartRange,
    pub points: Vec<ChartPoint>,
    pub rain_scale: TickScale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedWeather {
    pub current: Option<CurrentObservation>,
    pub trends: SeriesTrends,
    /// Extremes over the last ~24h
    pub extremes: SeriesExtremes,
    pub precipitation: PrecipitationSummary,
    pub sun: SunState,
    pub moon: MoonState,
    pub charts: Vec<ChartSeries>,
    pub forecast: Vec<ForecastDay>,
}

impl DerivedWeather {
    pub fn chart(&self, range: ChartRange) -> Option<&ChartSeries> {
        self.charts.iter().find(|c| c.range == range)
    }
}

pub fn chart_series(inputs: &WeatherInputs, range: ChartRange) -> ChartSeries {
    let points = prepare_chart_series(inputs.series(range));
    let rain_scale = cumulative_tick_scale(&points);
    ChartSeries {
        range,
        points,
        rain_scale,
    }
}

/// Fan the inputs out to every calculator. Never fails; missing inputs give
/// the "no data" shape of each section.
pub fn derive(inputs: &WeatherInputs, now: DateTime<Utc>, tz: Tz) -> DerivedWeather {
    let charts = [ChartRange::Day, ChartRange::SevenDays, ChartRange::ThirtyDays]
        .into_iter()
        .map(|range| chart_series(inputs, range))
        .collect();

    DerivedWeather {
        current: inputs.current.clone(),
        trends: series_trends(&inputs.hourly),
        extremes: series_extremes(&inputs.hourly),
        precipitation: precipitation_summary(&inputs.hourly, &inputs.daily, now, tz),
        sun: sun_state(inputs.sun.as_ref(), now, tz),
        moon: moon_state(inputs.moon.as_ref(), now),
        charts,
        forecast: aggregate_forecast(&inputs.forecast),
    }
}
