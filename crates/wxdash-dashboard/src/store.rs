//! Dashboard state store.
//!
//! All writes go through the store, and every accepted write is pushed to
//! subscribers as a fresh snapshot. Refresh results carry a ticket so that a
//! slow, older cycle can never overwrite the results of a newer one.
//!
//! Snapshots are delivered in the order the writes happened. A snapshot that
//! loses the race to a newer one is not delivered at all. Subscribers may read
//! the store or subscribe from inside a callback, but must not write to it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use wxdash_weather::DerivedWeather;

use crate::error::{ErrorNotice, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing fetched yet and nothing in flight
    #[default]
    Idle,
    /// First fetch outstanding
    Loading,
    /// Data is available (a background refresh may be running)
    Ready,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub load_state: LoadState,
    pub weather: Option<Arc<DerivedWeather>>,
    pub section_errors: BTreeMap<Section, ErrorNotice>,
    /// Dismissible banner; the previous data stays visible underneath.
    pub fatal_error: Option<ErrorNotice>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Generation of the last refresh cycle that was applied or failed
    pub generation: u64,
}

/// Proof that a refresh cycle was started, used to order results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

type Subscriber = Arc<dyn Fn(&DashboardState) + Send + Sync>;

struct Inner {
    state: DashboardState,
    last_started: u64,
    /// Bumped on every accepted write
    revision: u64,
}

impl Inner {
    fn publish(&mut self) -> (u64, DashboardState) {
        self.revision += 1;
        (self.revision, self.state.clone())
    }
}

pub struct DashboardStore {
    inner: RwLock<Inner>,
    subscribers: RwLock<Vec<Subscriber>>,
    /// Revision of the last snapshot handed to subscribers
    delivered: Mutex<u64>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: DashboardState::default(),
                last_started: 0,
                revision: 0,
            }),
            subscribers: RwLock::new(Vec::new()),
            delivered: Mutex::new(0),
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> DashboardState {
        self.inner.read().state.clone()
    }

    /// Register a callback run after every accepted state change.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&DashboardState) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Arc::new(callback));
    }

    /// Start a refresh cycle. Tickets are numbered in start order.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let (ticket, changed) = {
            let mut inner = self.inner.write();
            inner.last_started += 1;
            let ticket = RefreshTicket {
                generation: inner.last_started,
            };
            let changed = inner.state.load_state == LoadState::Idle;
            if changed {
                inner.state.load_state = LoadState::Loading;
            }
            (ticket, changed.then(|| inner.publish()))
        };
        if let Some((revision, snapshot)) = changed {
            self.notify(revision, &snapshot);
        }
        ticket
    }

    /// True if no newer cycle has already landed.
    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        ticket.generation > self.inner.read().state.generation
    }

    /// Store a successful cycle's results. Returns `false` if the ticket was
    /// superseded and the results were discarded.
    pub fn apply(
        &self,
        ticket: RefreshTicket,
        weather: DerivedWeather,
        section_errors: BTreeMap<Section, ErrorNotice>,
        fetched_at: DateTime<Utc>,
    ) -> bool {
        let published = {
            let mut inner = self.inner.write();
            if ticket.generation <= inner.state.generation {
                tracing::debug!(
                    "Discarding results of refresh {} (already at {})",
                    ticket.generation,
                    inner.state.generation
                );
                return false;
            }
            let state = &mut inner.state;
            state.generation = ticket.generation;
            state.load_state = LoadState::Ready;
            state.weather = Some(Arc::new(weather));
            state.section_errors = section_errors;
            state.fatal_error = None;
            state.last_updated = Some(fetched_at);
            inner.publish()
        };
        self.notify(published.0, &published.1);
        true
    }

    /// Record a failed cycle. Previously applied data is kept as is.
    pub fn fail(&self, ticket: RefreshTicket, error: ErrorNotice) -> bool {
        let published = {
            let mut inner = self.inner.write();
            if ticket.generation <= inner.state.generation {
                tracing::debug!(
                    "Ignoring failure of refresh {} (already at {})",
                    ticket.generation,
                    inner.state.generation
                );
                return false;
            }
            let state = &mut inner.state;
            state.generation = ticket.generation;
            state.fatal_error = Some(error);
            if state.weather.is_none() {
                state.load_state = LoadState::Idle;
            }
            inner.publish()
        };
        self.notify(published.0, &published.1);
        true
    }

    /// Hide the fatal error banner.
    pub fn dismiss_error(&self) {
        let published = {
            let mut inner = self.inner.write();
            if inner.state.fatal_error.take().is_none() {
                return;
            }
            inner.publish()
        };
        self.notify(published.0, &published.1);
    }

    fn notify(&self, revision: u64, snapshot: &DashboardState) {
        let subscribers: Vec<Subscriber> = self.subscribers.read().clone();
        let mut delivered = self.delivered.lock();
        if revision <= *delivered {
            tracing::debug!(
                "Skipping snapshot {} (subscribers already saw {})",
                revision,
                *delivered
            );
            return;
        }
        *delivered = revision;
        for subscriber in &subscribers {
            subscriber(snapshot);
        }
    }
}
