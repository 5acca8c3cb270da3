//! Weather derivation for wxdash
//!
//! Turns raw station records and the Open-Meteo forecast into the values the
//! dashboard cards and charts display. Everything below `derive` is pure and
//! synchronous; only the sources touch the network or the filesystem.

pub mod astro;
pub mod chart;
pub mod derive;
pub mod error;
pub mod extremes;
pub mod forecast;
pub mod normalize;
pub mod precipitation;
pub mod provider;
pub mod source;
pub mod trend;
pub mod types;

pub use chart::{build_chart_series, prepare_chart_series, tick_scale, ChartRange};
pub use derive::{derive, ChartSeries, DerivedWeather, WeatherInputs};
pub use error::WeatherError;
pub use forecast::aggregate_forecast;
pub use normalize::{normalize, FieldMapping};
pub use provider::OpenMeteoProvider;
pub use source::{Forecast, ForecastSource, SeriesFeed, SnapshotSource, StationSource};
pub use types::*;
