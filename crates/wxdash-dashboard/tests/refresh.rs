use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wxdash_dashboard::{DashboardStore, LoadState, RefreshOutcome, RefreshService, Section};
use wxdash_weather::{
    CurrentObservation, Forecast, ForecastSource, MoonInfo, SeriesFeed, StationSource,
    WeatherError,
};

/// In-memory station. Each `current()` call takes the next configured delay
/// and reports the call number as its temperature.
#[derive(Default)]
struct FakeStation {
    calls: AtomicUsize,
    delays: Mutex<VecDeque<Duration>>,
    fail_current: bool,
    fail_daily: bool,
}

impl FakeStation {
    fn with_delays(delays: &[u64]) -> Self {
        Self {
            delays: Mutex::new(delays.iter().map(|ms| Duration::from_millis(*ms)).collect()),
            ..Default::default()
        }
    }
}

fn hourly_records() -> Vec<Value> {
    let now = Utc::now();
    (0..4)
        .map(|i| {
            let rate = if i == 3 { 1.2 } else { 0.0 };
            json!({
                "timestamp": (now - ChronoDuration::hours(3 - i)).to_rfc3339(),
                "temperature": 10 + i,
                "precipRate": rate,
            })
        })
        .collect()
}

impl StationSource for FakeStation {
    async fn current(&self) -> Result<CurrentObservation, WeatherError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_current {
            return Err(WeatherError::Source("station offline".into()));
        }
        Ok(CurrentObservation {
            temperature: Some(call as f64),
            ..Default::default()
        })
    }

    async fn series(&self, feed: SeriesFeed) -> Result<Vec<Value>, WeatherError> {
        match feed {
            SeriesFeed::Hourly => Ok(hourly_records()),
            SeriesFeed::SevenDay => Ok(hourly_records()),
            SeriesFeed::Daily if self.fail_daily => {
                Err(WeatherError::Source("history endpoint down".into()))
            }
            SeriesFeed::Daily => Ok(vec![json!({"date": "2024-05-01", "precipTotal": 2.0})]),
        }
    }

    async fn moon(&self) -> Result<MoonInfo, WeatherError> {
        Ok(MoonInfo {
            phase_value: Some(0.25),
            phase_emoji: None,
            phase_key: None,
        })
    }
}

struct FakeForecast {
    fail: bool,
}

impl ForecastSource for FakeForecast {
    async fn forecast(&self) -> Result<Forecast, WeatherError> {
        if self.fail {
            Err(WeatherError::MissingField("hourly".into()))
        } else {
            Ok(Forecast::default())
        }
    }
}

fn service(
    station: FakeStation,
    fail_forecast: bool,
) -> RefreshService<FakeStation, FakeForecast> {
    RefreshService::new(
        station,
        FakeForecast {
            fail: fail_forecast,
        },
        Arc::new(DashboardStore::new()),
        Tz::UTC,
    )
}

fn current_temperature(service: &RefreshService<FakeStation, FakeForecast>) -> Option<f64> {
    service
        .store()
        .snapshot()
        .weather
        .and_then(|w| w.current.as_ref().and_then(|c| c.temperature))
}

#[tokio::test]
async fn test_refresh_applies_derived_state() {
    let service = service(FakeStation::default(), false);
    assert_eq!(service.refresh_once().await, RefreshOutcome::Applied);

    let state = service.store().snapshot();
    assert_eq!(state.load_state, LoadState::Ready);
    assert!(state.section_errors.is_empty());
    assert!(state.last_updated.is_some());

    let weather = state.weather.unwrap();
    assert!(weather.precipitation.event.is_active);
    assert_eq!(weather.trends.temperature.delta, Some(1.0));
    assert_eq!(weather.moon.cycle_progress_percent, Some(25.0));
}

#[tokio::test]
async fn test_non_critical_failures_become_section_errors() {
    let station = FakeStation {
        fail_daily: true,
        ..Default::default()
    };
    let service = service(station, true);
    assert_eq!(service.refresh_once().await, RefreshOutcome::Applied);

    let state = service.store().snapshot();
    assert!(state.fatal_error.is_none());
    assert_eq!(
        state.section_errors.keys().copied().collect::<Vec<_>>(),
        vec![Section::History, Section::Forecast]
    );
    let weather = state.weather.unwrap();
    assert_eq!(weather.precipitation.windows.month.total_mm, None);
    assert!(weather.forecast.is_empty());
    assert_eq!(weather.sun.progress_percent, 0.0);
}

#[tokio::test]
async fn test_fatal_failure_keeps_previous_state() {
    let service = service(FakeStation::default(), false);
    service.refresh_once().await;
    let before = service.store().snapshot();

    let failing = RefreshService::new(
        FakeStation {
            fail_current: true,
            ..Default::default()
        },
        FakeForecast { fail: false },
        Arc::clone(service.store()),
        Tz::UTC,
    );
    assert_eq!(failing.refresh_once().await, RefreshOutcome::Failed);

    let after = service.store().snapshot();
    assert_eq!(after.load_state, LoadState::Ready);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(current_temperature(&service), Some(1.0));
    let banner = after.fatal_error.unwrap();
    assert!(banner.detail.contains("station offline"));

    service.store().dismiss_error();
    assert!(service.store().snapshot().fatal_error.is_none());
}

#[tokio::test]
async fn test_slow_cycle_cannot_overwrite_newer_one() {
    // first cycle's current() sleeps, the second one returns immediately
    let service = service(FakeStation::with_delays(&[150, 0]), false);

    let (first, second) = tokio::join!(service.refresh_once(), service.refresh_once());

    assert_eq!(first, RefreshOutcome::Superseded);
    assert_eq!(second, RefreshOutcome::Applied);
    assert_eq!(service.store().snapshot().generation, 2);
    assert_eq!(current_temperature(&service), Some(2.0));
}

#[tokio::test]
async fn test_run_until_cancelled() {
    let service = service(FakeStation::default(), false);
    let cancel = CancellationToken::new();
    let notified = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&notified);
    service.store().subscribe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let stopper = cancel.clone();
    tokio::join!(service.run(Duration::from_millis(20), cancel), async move {
        tokio::time::sleep(Duration::from_millis(110)).await;
        stopper.cancel();
    });

    let generation = service.store().snapshot().generation;
    assert!(generation >= 2, "expected several cycles, got {}", generation);
    assert!(notified.load(Ordering::SeqCst) as u64 > generation);
}
