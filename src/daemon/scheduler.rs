//! Refresh scheduler
//!
//! A single event loop owns the selected display mode, the current
//! [`MenuView`] and the tray surface. Everything else talks to it through a
//! [`SchedulerHandle`]:
//!
//! - the periodic timer, first firing one interval after start
//! - manual refresh requests (menu click, `SIGUSR1`)
//! - mode selection (menu click, `SIGUSR2` after `show`)
//! - quit, either as an event or through the shutdown watch channel
//!
//! Fetches run as their own tasks so a slow request never blocks the loop.
//! Each task writes the shared cache on success and reports back with
//! [`SchedulerEvent::FetchCompleted`]; rendering only ever happens on the loop.
//! Overlapping fetches are allowed and the last one to finish wins; a
//! completion always renders whatever the cache holds at that point.

use super::context::AppContext;
use crate::display::{MenuView, TraySurface};
use crate::errors::FetchError;
use crate::models::{DisplayMode, UsageSnapshot};
use anyhow::Result;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn, Instrument, Span};

#[derive(Debug)]
pub enum SchedulerEvent {
    TimerTick,
    ManualRefresh,
    Quit,
    SelectMode(DisplayMode),
    FetchCompleted(Result<Arc<UsageSnapshot>, FetchError>),
}

/// Cloneable sender side of the scheduler's event queue
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<SchedulerEvent>,
}

impl SchedulerHandle {
    fn send(&self, event: SchedulerEvent) {
        if self.tx.send(event).is_err() {
            debug!("Scheduler already stopped, dropping event");
        }
    }

    pub fn refresh(&self) {
        self.send(SchedulerEvent::ManualRefresh);
    }

    pub fn select_mode(&self, mode: DisplayMode) {
        self.send(SchedulerEvent::SelectMode(mode));
    }

    pub fn quit(&self) {
        self.send(SchedulerEvent::Quit);
    }
}

pub struct RefreshScheduler {
    ctx: AppContext,
    surface: Box<dyn TraySurface + Send>,
    interval: Duration,
    mode: DisplayMode,
    view: MenuView,
    /// Most recent selection; persistence tasks always write this value
    pending_mode: Arc<Mutex<DisplayMode>>,
    persist_lock: Arc<Mutex<()>>,
    tx: mpsc::UnboundedSender<SchedulerEvent>,
    rx: mpsc::UnboundedReceiver<SchedulerEvent>,
}

impl RefreshScheduler {
    /// Build a scheduler starting in the mode the store holds
    pub fn new(ctx: AppContext, surface: Box<dyn TraySurface + Send>, interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mode = ctx.store.load_display_mode();

        Self {
            ctx,
            surface,
            interval,
            mode,
            view: MenuView::loading(mode),
            pending_mode: Arc::new(Mutex::new(mode)),
            persist_lock: Arc::new(Mutex::new(())),
            tx,
            rx,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Run until a quit event arrives or `shutdown` flips to true.
    ///
    /// Releases the PID marker and closes the surface before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            mode = %self.mode,
            interval_secs = self.interval.as_secs(),
            "Starting refresh scheduler"
        );

        self.surface.render(&self.view);
        self.spawn_fetch("startup");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.handle_event(SchedulerEvent::TimerTick);
                }
                Some(event) = self.rx.recv() => {
                    if !self.handle_event(event) {
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                }
            }
        }

        self.stop();
        Ok(())
    }

    /// Returns false once the loop should stop
    fn handle_event(&mut self, event: SchedulerEvent) -> bool {
        match event {
            SchedulerEvent::TimerTick => self.spawn_fetch("timer"),
            SchedulerEvent::ManualRefresh => self.spawn_fetch("manual"),
            SchedulerEvent::SelectMode(mode) => {
                self.apply_mode(mode);
                self.persist_mode(mode);
            }
            SchedulerEvent::FetchCompleted(result) => self.on_fetch_completed(result),
            SchedulerEvent::Quit => {
                info!("Quit requested");
                return false;
            }
        }
        true
    }

    fn spawn_fetch(&self, trigger: &'static str) {
        debug!(trigger, "Refreshing usage");

        let source = Arc::clone(&self.ctx.source);
        let cache = self.ctx.cache.clone();
        let tx = self.tx.clone();

        tokio::spawn(
            async move {
                let result = source.fetch().await.map(Arc::new);
                if let Ok(snapshot) = &result {
                    cache.set(Arc::clone(snapshot));
                }
                // The loop may have stopped while this fetch was in flight
                let _ = tx.send(SchedulerEvent::FetchCompleted(result));
            }
            .instrument(Span::current()),
        );
    }

    fn on_fetch_completed(&mut self, result: Result<Arc<UsageSnapshot>, FetchError>) {
        match result {
            Ok(snapshot) => {
                // A fetch that finished later may already have replaced the cache
                let latest = self.ctx.cache.get().unwrap_or(snapshot);
                self.view.apply_snapshot(&latest, self.mode, Utc::now());
                debug!(title = %self.view.title, "Usage updated");
            }
            Err(e) => {
                if e.is_auth_failure() {
                    warn!(error = %e, "Session rejected, login required");
                } else {
                    error!(error = %e, "Failed to fetch usage");
                }
                self.view.apply_error(&e);
            }
        }
        self.surface.render(&self.view);
    }

    fn apply_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
        let cached = self.ctx.cache.get();
        self.view.select(mode, cached.as_deref(), Utc::now());
        self.surface.render(&self.view);
        info!(mode = %mode, "Display mode selected");
    }

    fn persist_mode(&self, mode: DisplayMode) {
        *self.pending_mode.lock() = mode;

        let store = Arc::clone(&self.ctx.store);
        let pending = Arc::clone(&self.pending_mode);
        let persist_lock = Arc::clone(&self.persist_lock);
        tokio::task::spawn_blocking(move || {
            // Blocking tasks may run in any order; each writes the newest selection
            let _serial = persist_lock.lock();
            let mode = *pending.lock();
            if let Err(e) = store.save_display_mode(mode) {
                error!(error = %e, mode = %mode, "Failed to save display mode");
            }
        });
    }

    fn stop(&mut self) {
        self.ctx.guard.release();
        self.surface.close();
        info!("Refresh scheduler stopped");
    }
}
