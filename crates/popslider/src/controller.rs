//! Popup lifecycle: gate evaluation, background fetch, close semantics.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use chrono::NaiveDate;

use crate::fetch::{FetchError, SlideFetcher, SlideRecord};
use crate::gate::{self, GateConfig};
use crate::store::CounterStore;

/// Banner text shown when the list could not be loaded.
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching popup data";
pub const NOT_CONFIGURED_MESSAGE: &str = "Popup is not configured: a list name and a site URL are required";

type Waker = Box<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Open,
    Closed,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupUiState {
    pub slides: Vec<SlideRecord>,
    pub fetch_error: Option<String>,
    pub is_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupSettings {
    pub list_name: Option<String>,
    pub site_url: Option<String>,
    pub max_popup_shows: u32,
}

impl PopupSettings {
    fn target(&self) -> Option<(String, String)> {
        let site = self.site_url.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let list = self.list_name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((site.to_string(), list.to_string()))
    }
}

pub struct PopupController<S: CounterStore> {
    store: S,
    fetcher: Arc<dyn SlideFetcher>,
    phase: Phase,
    state: PopupUiState,
    /// Gate result, evaluated at most once per controller.
    gate: Option<bool>,
    dismissed: bool,
    alive: Arc<AtomicBool>,
    pending: Option<Receiver<Result<Vec<SlideRecord>, FetchError>>>,
    /// Shared with fetch workers, so a waker set after `init` still fires.
    waker: Arc<Mutex<Option<Waker>>>,
}

impl<S: CounterStore> PopupController<S> {
    pub fn new(store: S, fetcher: Arc<dyn SlideFetcher>) -> Self {
        Self {
            store,
            fetcher,
            phase: Phase::Idle,
            state: PopupUiState::default(),
            gate: None,
            dismissed: false,
            alive: Arc::new(AtomicBool::new(true)),
            pending: None,
            waker: Arc::new(Mutex::new(None)),
        }
    }

    /// Called from the worker thread once a fetch has settled.
    pub fn set_waker(&mut self, waker: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut slot) = self.waker.lock() {
            *slot = Some(Box::new(waker));
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &PopupUiState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    /// Start (or restart) the popup for `settings`.
    ///
    /// Each call starts a fresh fetch, but the daily gate runs only on the
    /// first configured call, so repeated initialization never bumps the
    /// persisted counter twice.
    pub fn init(&mut self, settings: &PopupSettings, today: NaiveDate) {
        if !self.alive.load(Ordering::Acquire) {
            return;
        }

        let Some((site_url, list_name)) = settings.target() else {
            tracing::warn!("popup list name or site URL missing; nothing to show");
            // Losing the configuration hides an open popup for good
            if self.state.is_open {
                self.dismissed = true;
            }
            self.pending = None;
            self.state.is_open = false;
            self.state.fetch_error = Some(NOT_CONFIGURED_MESSAGE.to_string());
            self.phase = Phase::Error;
            return;
        };

        self.phase = Phase::Loading;
        self.state.fetch_error = None;
        self.start_fetch(site_url, list_name);

        let should_show = match self.gate {
            Some(decided) => decided,
            None => {
                let decided = self.evaluate_gate(settings.max_popup_shows, today);
                self.gate = Some(decided);
                decided
            }
        };

        self.state.is_open = should_show && !self.dismissed;
        self.phase = if self.state.is_open {
            Phase::Open
        } else {
            Phase::Closed
        };
    }

    fn evaluate_gate(&self, max_popup_shows: u32, today: NaiveDate) -> bool {
        let stored = self.store.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read popup counter; treating as first visit");
            None
        });

        let config = GateConfig {
            max_shows_per_day: max_popup_shows.max(1),
        };
        let decision = gate::evaluate(today, stored.as_ref(), config);

        if let Err(e) = self.store.write(&decision.next_state) {
            tracing::warn!(error = %e, "could not persist popup counter");
        }

        tracing::info!(
            show = decision.should_show,
            shown_today = decision.next_state.shown_count,
            max = config.max_shows_per_day,
            "popup gate evaluated"
        );
        decision.should_show
    }

    fn start_fetch(&mut self, site_url: String, list_name: String) {
        let (tx, rx) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let alive = Arc::clone(&self.alive);
        let waker = Arc::clone(&self.waker);

        let spawned = std::thread::Builder::new()
            .name("slide-fetch".to_string())
            .spawn(move || {
                let result = fetcher.fetch_slides(&site_url, &list_name);
                if alive.load(Ordering::Acquire) && tx.send(result).is_ok() {
                    if let Some(wake) = waker.lock().ok().as_deref().and_then(Option::as_ref) {
                        wake();
                    }
                }
            });

        match spawned {
            // Replacing the receiver discards any earlier fetch still in flight
            Ok(_) => self.pending = Some(rx),
            Err(e) => {
                tracing::error!(error = %e, "could not start slide fetch");
                self.pending = None;
                self.state.slides.clear();
                self.state.fetch_error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// Apply a settled fetch, if any. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        let Some(rx) = &self.pending else {
            return false;
        };

        let outcome = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                Err(FetchError::Transport("fetch worker exited without a result".to_string()))
            }
        };
        self.pending = None;
        self.apply(outcome);
        true
    }

    fn apply(&mut self, outcome: Result<Vec<SlideRecord>, FetchError>) {
        match outcome {
            Ok(slides) => {
                tracing::debug!(count = slides.len(), "slides loaded");
                self.state.slides = slides;
                self.state.fetch_error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error fetching data");
                self.state.slides = Vec::new();
                self.state.fetch_error = Some(FETCH_ERROR_MESSAGE.to_string());
            }
        }
    }

    /// User dismissal. Nothing reopens the popup afterwards.
    pub fn close(&mut self) {
        self.dismissed = true;
        self.state.is_open = false;
        if self.phase != Phase::Error {
            self.phase = Phase::Closed;
        }
    }

    /// Stop accepting fetch results; a worker still running drops its result.
    pub fn teardown(&mut self) {
        self.alive.store(false, Ordering::Release);
        self.pending = None;
    }

    #[cfg(test)]
    fn settle(&mut self, timeout: std::time::Duration) -> bool {
        let Some(rx) = &self.pending else {
            return false;
        };
        let outcome = match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => return false,
        };
        self.pending = None;
        self.apply(outcome);
        true
    }
}

impl<S: CounterStore> Drop for PopupController<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
