//! `watch`: run the scheduler in the foreground with the terminal surface

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::client::ClaudeUsageClient;
use crate::config::Config;
use crate::daemon::{self, AppContext, RefreshScheduler};
use crate::display::tui::{forward_keys, TerminalSurface};
use crate::session::SessionStore;

pub async fn run_watch(config: &Config) -> Result<()> {
    let guard = Arc::new(daemon::pid_guard(config));
    if guard.is_active() {
        bail!("Claude Monitor Lite is already running. Use 'claude-monitor-lite stop' to stop it first.");
    }

    let store = Arc::new(SessionStore::new(&config.paths.session_file));
    let session = store
        .load_session()
        .context("Not authenticated. Please run 'claude-monitor-lite' to login first")?;
    let client = ClaudeUsageClient::from_session(
        &session,
        config.monitor.api_base_url.as_str(),
        config.monitor.request_timeout(),
    )?;

    guard.claim()?;
    info!(pid = std::process::id(), "Watching usage in the foreground");

    let surface = match TerminalSurface::new() {
        Ok(surface) => surface,
        Err(e) => {
            guard.release();
            return Err(e);
        }
    };

    let ctx = AppContext::new(Arc::new(client), store.clone(), guard);
    let scheduler = RefreshScheduler::new(ctx, Box::new(surface), config.monitor.refresh_interval());
    let handle = scheduler.handle();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    daemon::spawn_signal_bridge(shutdown_tx, Some(handle.clone()), store)?;
    tokio::spawn(forward_keys(handle));

    scheduler.run(shutdown_rx).await
}
