//! Fetch-then-derive refresh cycles.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use wxdash_weather::{
    derive, normalize, ForecastSource, SeriesFeed, StationSource, WeatherError, WeatherInputs,
};

use crate::error::{ErrorNotice, Section};
use crate::store::{DashboardStore, RefreshTicket};

/// What happened to one refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Current or hourly observations failed; previous state kept
    Failed,
    /// A newer cycle landed first; these results were dropped
    Superseded,
}

pub struct RefreshService<S, F> {
    station: S,
    forecast: F,
    store: Arc<DashboardStore>,
    timezone: Tz,
}

impl<S, F> RefreshService<S, F>
where
    S: StationSource,
    F: ForecastSource,
{
    pub fn new(station: S, forecast: F, store: Arc<DashboardStore>, timezone: Tz) -> Self {
        Self {
            station,
            forecast,
            store,
            timezone,
        }
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    /// Run one cycle: fetch everything concurrently, derive, hand to the store.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let ticket = self.store.begin_refresh();
        tracing::info!("Refresh {} started", ticket.generation());

        let (current, hourly, week, daily, moon, forecast) = tokio::join!(
            self.station.current(),
            self.station.series(SeriesFeed::Hourly),
            self.station.series(SeriesFeed::SevenDay),
            self.station.series(SeriesFeed::Daily),
            self.station.moon(),
            self.forecast.forecast(),
        );

        let current = match current {
            Ok(current) => current,
            Err(e) => return self.fail(ticket, "current conditions", e),
        };
        let hourly = match hourly {
            Ok(records) => records,
            Err(e) => return self.fail(ticket, "hourly series", e),
        };

        let mut section_errors = BTreeMap::new();
        let week = recover(Section::SevenDay, week, &mut section_errors).unwrap_or_default();
        let daily = recover(Section::History, daily, &mut section_errors).unwrap_or_default();
        let moon = recover(Section::Moon, moon, &mut section_errors);
        let forecast = recover(Section::Forecast, forecast, &mut section_errors).unwrap_or_default();

        let tz = self.timezone;
        let inputs = WeatherInputs {
            current: Some(current),
            hourly: normalize(&hourly, &SeriesFeed::Hourly.mapping(), tz),
            week: normalize(&week, &SeriesFeed::SevenDay.mapping(), tz),
            daily: normalize(&daily, &SeriesFeed::Daily.mapping(), tz),
            sun: forecast.sun,
            moon,
            forecast: forecast.hours,
        };

        let now = Utc::now();
        let derived = derive(&inputs, now, tz);

        if self.store.apply(ticket, derived, section_errors, now) {
            tracing::info!("Refresh {} applied", ticket.generation());
            RefreshOutcome::Applied
        } else {
            tracing::info!("Refresh {} superseded by a newer one", ticket.generation());
            RefreshOutcome::Superseded
        }
    }

    fn fail(&self, ticket: RefreshTicket, what: &str, err: WeatherError) -> RefreshOutcome {
        if err.is_transient() {
            tracing::warn!(
                "Refresh {} failed, retrying next cycle: {} unavailable: {}",
                ticket.generation(),
                what,
                err
            );
        } else {
            tracing::error!("Refresh {} failed: {} unavailable: {}", ticket.generation(), what, err);
        }
        if self.store.fail(ticket, ErrorNotice::fatal(err)) {
            RefreshOutcome::Failed
        } else {
            RefreshOutcome::Superseded
        }
    }

    /// Refresh immediately, then every `period`, until `cancel` fires.
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        tracing::info!("Refreshing every {} seconds", period.as_secs());
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        outcome = self.refresh_once() => {
                            tracing::debug!("Refresh outcome: {:?}", outcome);
                        }
                    }
                }
            }
        }
        tracing::info!("Refresh loop stopped");
    }
}

/// Non-critical fetch: log the failure, note it for the section, carry on without it.
fn recover<T>(
    section: Section,
    result: Result<T, WeatherError>,
    errors: &mut BTreeMap<Section, ErrorNotice>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{} unavailable: {}", section, e);
            errors.insert(section, ErrorNotice::section(section, &e));
            None
        }
    }
}
