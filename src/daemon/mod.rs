//! Background worker
//!
//! The worker claims the PID marker, builds the usage client from the stored
//! session and runs the [`RefreshScheduler`] against the headless status-file
//! surface. Unix signals stand in for menu clicks:
//!
//! | Signal | Effect |
//! |---|---|
//! | `SIGUSR1` | refresh now |
//! | `SIGUSR2` | re-read the display mode from the session file |
//! | `SIGTERM`, `SIGINT` | shut down |

pub mod cache;
pub mod context;
pub mod detach;
pub mod pid;
pub mod process;
pub mod scheduler;

pub use cache::SharedCache;
pub use context::AppContext;
pub use detach::{ensure_detached, is_worker, spawn_detached, Detached, DAEMON_ENV};
pub use pid::PidGuard;
pub use process::{ProcessProbe, SignalProbe};
pub use scheduler::{RefreshScheduler, SchedulerEvent, SchedulerHandle};

use crate::client::ClaudeUsageClient;
use crate::config::Config;
use crate::display::{MenuView, StatusFileSurface, TraySurface};
use crate::logging;
use crate::session::{ModeStore, SessionStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};

/// Marker guard for the configured PID file
pub fn pid_guard(config: &Config) -> PidGuard {
    PidGuard::new(&config.paths.pid_file, Arc::new(SignalProbe))
}

/// Run the detached worker until it is told to stop
pub async fn run_worker(config: &Config) -> Result<()> {
    let span = logging::run_span();
    async move {
        let guard = Arc::new(pid_guard(config));
        guard.claim().context("Failed to create PID file")?;
        info!(pid = std::process::id(), "Background worker started");

        let store = Arc::new(SessionStore::new(&config.paths.session_file));
        let mut surface = StatusFileSurface::new(&config.paths.status_file);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = match store.load_session() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "No stored session, waiting for shutdown");
                surface.render(&MenuView::not_logged_in());
                spawn_signal_bridge(shutdown_tx, None, store)?;
                wait_for_shutdown(shutdown_rx).await;
                guard.release();
                surface.close();
                return Ok(());
            }
        };

        let client = ClaudeUsageClient::from_session(
            &session,
            config.monitor.api_base_url.as_str(),
            config.monitor.request_timeout(),
        )
        .context("Failed to build usage client")?;

        let ctx = AppContext::new(Arc::new(client), store.clone(), guard);
        let scheduler = RefreshScheduler::new(
            ctx,
            Box::new(surface),
            config.monitor.refresh_interval(),
        );
        spawn_signal_bridge(shutdown_tx, Some(scheduler.handle()), store)?;

        scheduler.run(shutdown_rx).await
    }
    .instrument(span)
    .await
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

/// Translate process signals into scheduler events.
///
/// Without a handle only the shutdown signals do anything.
pub(crate) fn spawn_signal_bridge(
    shutdown: watch::Sender<bool>,
    handle: Option<SchedulerHandle>,
    store: Arc<SessionStore>,
) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to listen for SIGINT")?;
    let mut sigusr1 =
        signal(SignalKind::user_defined1()).context("Failed to listen for SIGUSR1")?;
    let mut sigusr2 =
        signal(SignalKind::user_defined2()).context("Failed to listen for SIGUSR2")?;

    tokio::spawn(
        async move {
            loop {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM");
                        break;
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT");
                        break;
                    }
                    _ = sigusr1.recv() => {
                        debug!("Received SIGUSR1");
                        if let Some(handle) = &handle {
                            handle.refresh();
                        }
                    }
                    _ = sigusr2.recv() => {
                        debug!("Received SIGUSR2");
                        if let Some(handle) = &handle {
                            let store = Arc::clone(&store);
                            match tokio::task::spawn_blocking(move || store.load_display_mode()).await {
                                Ok(mode) => handle.select_mode(mode),
                                Err(e) => error!(error = %e, "Failed to reload display mode"),
                            }
                        }
                    }
                }
            }
            let _ = shutdown.send(true);
        }
        .in_current_span(),
    );

    Ok(())
}
