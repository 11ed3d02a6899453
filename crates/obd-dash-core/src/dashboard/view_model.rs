//! Dashboard view model
//!
//! Owns the current reading window and drives refreshes, either manually or
//! from the auto-refresh timer. Both paths share [`DashboardViewModel::refresh`].
//!
//! Concurrent refreshes are allowed and are not cancelled. Whichever
//! response completes last replaces the window (last-write-wins), even if it
//! was issued earlier. Each refresh carries a sequence number so such
//! out-of-order completions show up in the logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::live::LiveMetrics;
use super::view::{DashboardView, Screen};
use super::ViewState;
use crate::client::{FetchOptions, Session, TelemetrySource};
use crate::config::Config;
use crate::reading::ReadingWindow;

/// Result of one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The window was replaced
    Updated {
        /// Issue order of the request
        seq: u64,
        /// Readings in the new window
        rows: usize,
    },
    /// The fetch failed; the previous window is kept
    Failed {
        /// Issue order of the request
        seq: u64,
        /// Rendered client error
        error: String,
    },
    /// The dashboard was shut down before the response arrived
    Discarded {
        /// Issue order of the request
        seq: u64,
    },
}

struct Display {
    state: ViewState,
    window: Arc<ReadingWindow>,
    live: Arc<LiveMetrics>,
    in_flight: usize,
    last_applied: u64,
    last_error: Option<String>,
}

struct Inner {
    source: Arc<dyn TelemetrySource>,
    session: Session,
    options: FetchOptions,
    refresh_interval: Duration,
    display: Mutex<Display>,
    timer: Mutex<Option<CancellationToken>>,
    unmounted: CancellationToken,
    next_seq: AtomicU64,
    revision: watch::Sender<u64>,
}

/// Shared handle to the dashboard state
#[derive(Clone)]
pub struct DashboardViewModel {
    inner: Arc<Inner>,
}

impl DashboardViewModel {
    /// Create a view model in the `Loading` state
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        session: Session,
        options: FetchOptions,
        refresh_interval: Duration,
    ) -> Self {
        let (revision, _rx) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                source,
                session,
                options,
                refresh_interval,
                display: Mutex::new(Display {
                    state: ViewState::Loading,
                    window: Arc::new(ReadingWindow::default()),
                    live: Arc::new(LiveMetrics::default()),
                    in_flight: 0,
                    last_applied: 0,
                    last_error: None,
                }),
                timer: Mutex::new(None),
                unmounted: CancellationToken::new(),
                next_seq: AtomicU64::new(0),
                revision,
            }),
        }
    }

    /// Create a view model using the configured limit and refresh period
    pub fn from_config(source: Arc<dyn TelemetrySource>, session: Session, config: &Config) -> Self {
        let options = FetchOptions {
            limit: Some(config.fetch_limit),
            ..FetchOptions::default()
        };
        Self::new(source, session, options, config.refresh_interval)
    }

    fn display(&self) -> MutexGuard<'_, Display> {
        self.inner
            .display
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn timer(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the first window and optionally start auto-refresh
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(&self, auto_refresh: bool) -> RefreshOutcome {
        self.set_auto_refresh(auto_refresh);
        self.refresh().await
    }

    /// Fetch a new window
    ///
    /// Failures are logged and leave the displayed window untouched.
    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut display = self.display();
            display.in_flight += 1;
            if display.state == ViewState::Ready {
                display.state = ViewState::Refreshing;
            }
        }
        debug!(seq, "Refresh started");

        let result = self.inner.source.fetch_readings(&self.inner.options).await;

        if self.inner.unmounted.is_cancelled() {
            debug!(seq, "Dashboard shut down, discarding response");
            return RefreshOutcome::Discarded { seq };
        }

        let outcome = {
            let mut display = self.display();
            display.in_flight = display.in_flight.saturating_sub(1);

            let outcome = match result {
                Ok(window) => {
                    let newer = display.last_applied;
                    if seq < newer {
                        debug!(seq, newer, "Older response replaced a newer one");
                    }
                    let rows = window.len();
                    display.live = Arc::new(LiveMetrics::from_window(&window));
                    display.window = Arc::new(window);
                    display.last_applied = seq;
                    display.last_error = None;
                    RefreshOutcome::Updated { seq, rows }
                }
                Err(e) => {
                    warn!(seq, "Refresh failed: {}", e);
                    let error = e.to_string();
                    display.last_error = Some(error.clone());
                    RefreshOutcome::Failed { seq, error }
                }
            };

            display.state = if display.in_flight == 0 {
                ViewState::Ready
            } else {
                ViewState::Refreshing
            };
            outcome
        };

        self.inner.revision.send_modify(|rev| *rev += 1);
        outcome
    }

    /// Turn the auto-refresh timer on or off
    ///
    /// Enabling schedules the first tick one full interval from now; ticks
    /// missed while disabled are not replayed. Disabling cancels the timer but
    /// lets a refresh already in flight finish. Enabling must happen within a
    /// Tokio runtime.
    pub fn set_auto_refresh(&self, enabled: bool) {
        let mut timer = self.timer();

        if !enabled {
            if let Some(token) = timer.take() {
                token.cancel();
                info!("Auto-refresh disabled");
            }
            return;
        }

        if timer.is_some() || self.inner.unmounted.is_cancelled() {
            return;
        }

        let token = self.inner.unmounted.child_token();
        tokio::spawn(run_timer(
            Arc::downgrade(&self.inner),
            token.clone(),
            self.inner.refresh_interval,
        ));
        *timer = Some(token);
        info!(interval = ?self.inner.refresh_interval, "Auto-refresh enabled");
    }

    /// Whether the auto-refresh timer is running
    pub fn auto_refresh_enabled(&self) -> bool {
        self.timer().is_some()
    }

    /// Stop the timer and discard responses still in flight
    pub fn shutdown(&self) {
        self.inner.unmounted.cancel();
        self.timer().take();
    }

    /// Current state machine position
    pub fn state(&self) -> ViewState {
        self.display().state
    }

    /// Current reading window
    pub fn window(&self) -> Arc<ReadingWindow> {
        Arc::clone(&self.display().window)
    }

    /// Live metrics of the current window
    pub fn live_metrics(&self) -> Arc<LiveMetrics> {
        Arc::clone(&self.display().live)
    }

    /// Message of the last failed refresh, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.display().last_error.clone()
    }

    /// The session this dashboard renders for
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Revision counter bumped after every completed refresh
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Build the frame to show
    ///
    /// A missing or torn down session always routes to the login screen.
    pub fn render(&self) -> Screen {
        if self.inner.session.requires_login() {
            return Screen::Login;
        }

        let auto_refresh = self.auto_refresh_enabled();
        let (state, window, live) = {
            let display = self.display();
            (
                display.state,
                Arc::clone(&display.window),
                Arc::clone(&display.live),
            )
        };

        match state {
            ViewState::Loading => Screen::Loading,
            _ => Screen::Dashboard(DashboardView::build(&window, &live, state, auto_refresh)),
        }
    }
}

async fn run_timer(inner: Weak<Inner>, token: CancellationToken, period: Duration) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                DashboardViewModel { inner }.refresh().await;
            }
        }
    }

    debug!("Auto-refresh timer stopped");
}
