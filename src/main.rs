use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use wxdash_core::{ChartRangeSetting, TemperatureUnit};
use wxdash_dashboard::{DashboardState, DashboardStore, LoadState, RefreshService};
use wxdash_weather::{ChartRange, Location, OpenMeteoProvider, SnapshotSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    wxdash_core::init()?;

    let mut app = wxdash_core::App::new()?;
    let config = app.config().clone();
    let timezone = config.display_timezone();

    let snapshot_dir = match &config.station.snapshot_dir {
        Some(dir) => dir.clone(),
        None => {
            let dir = config.config_dir.join("station");
            tracing::warn!(
                "station.snapshot_dir not set, reading station data from {}",
                dir.display()
            );
            dir
        }
    };

    let station = SnapshotSource::new(snapshot_dir);
    tracing::info!("Reading station snapshots from {}", station.dir().display());
    let forecast = OpenMeteoProvider::with_base_url(
        &config.weather.forecast_api_url,
        Location {
            latitude: config.station.latitude,
            longitude: config.station.longitude,
        },
        timezone,
    )?;

    let store = Arc::new(DashboardStore::new());
    let unit = config.weather.temperature_unit;
    let range = chart_range(config.ui.chart_range);
    store.subscribe(move |state| log_summary(state, unit, range));

    let service = RefreshService::new(station, forecast, Arc::clone(&store), timezone);

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, stopping");
        }
        stopper.cancel();
    });

    let period = Duration::from_secs(u64::from(config.weather.refresh_minutes.max(1)) * 60);
    tracing::info!("wxdash started (timezone {})", timezone.name());
    service.run(period, cancel).await;

    // Graceful shutdown
    app.shutdown()?;

    Ok(())
}

fn chart_range(setting: ChartRangeSetting) -> ChartRange {
    match setting {
        ChartRangeSetting::Day => ChartRange::Day,
        ChartRangeSetting::SevenDays => ChartRange::SevenDays,
        ChartRangeSetting::ThirtyDays => ChartRange::ThirtyDays,
    }
}

fn log_summary(state: &DashboardState, unit: TemperatureUnit, range: ChartRange) {
    if let Some(error) = &state.fatal_error {
        tracing::warn!("{} ({})", error.message, error.detail);
    }
    for (section, notice) in &state.section_errors {
        tracing::warn!("{}: {}", section, notice.message);
    }

    if state.load_state == LoadState::Loading {
        tracing::info!("Loading station data...");
    }

    let Some(weather) = &state.weather else {
        return;
    };

    let temperature = weather
        .current
        .as_ref()
        .and_then(|c| c.temperature)
        .map(|t| format!("{:.1}{}", unit.from_celsius(t), unit.symbol()))
        .unwrap_or_else(|| "--".to_string());
    let trend = weather
        .trends
        .temperature
        .delta
        .map(|d| format!("{:+.1}", d))
        .unwrap_or_else(|| "--".to_string());
    let rain = &weather.precipitation;

    tracing::info!(
        "Now {} ({} in 1h), raining: {}, since midnight: {:.1} mm, 7d: {:.1} mm",
        temperature,
        trend,
        rain.event.is_active,
        rain.since_midnight.unwrap_or(0.0),
        rain.windows.week.total_mm.unwrap_or(0.0)
    );

    if let Some(chart) = weather.chart(range) {
        tracing::info!(
            "{} chart: {} points, rain axis up to {} mm",
            range.label(),
            chart.points.len(),
            chart.rain_scale.domain.1
        );
    }
    if let Some(day) = weather.forecast.first() {
        tracing::info!(
            "Forecast {}: {} days, {} in the afternoon",
            day.date,
            weather.forecast.len(),
            day.afternoon
                .condition
                .map(|c| c.description())
                .unwrap_or("unknown")
        );
    }
    tracing::debug!(
        "Sun {:.0}% ({:?}), next full moon {}",
        weather.sun.progress_percent,
        weather.sun.period,
        weather.moon.next_full_moon
    );
}
