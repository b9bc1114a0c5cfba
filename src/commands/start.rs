//! Default command: log in if needed, then show status or start the worker

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::auth;
use crate::client::ClaudeUsageClient;
use crate::config::Config;
use crate::daemon::{self, Detached};
use crate::display::print_usage_stats;
use crate::session::SessionStore;

use super::status::run_status;

pub async fn run_auto_start(config: &Config) -> Result<()> {
    let store = SessionStore::new(&config.paths.session_file);

    let session = match store.load_session() {
        Ok(session) => session,
        Err(_) => {
            println!("⚠️  Not authenticated");
            println!();
            auth::login(config, &store).await?
        }
    };

    if daemon::pid_guard(config).is_active() {
        return run_status(config).await;
    }

    // Best effort; the worker keeps retrying on its own
    match ClaudeUsageClient::from_session(
        &session,
        config.monitor.api_base_url.as_str(),
        config.monitor.request_timeout(),
    ) {
        Ok(client) => match client.get_usage_limits().await {
            Ok(snapshot) => print_usage_stats(&snapshot),
            Err(e) => debug!(error = %e, "Skipping usage preview"),
        },
        Err(e) => debug!(error = %e, "Skipping usage preview"),
    }

    println!("⚙️  Starting Claude Monitor Lite...");
    println!();
    info!("Starting background worker");

    match daemon::ensure_detached(config.monitor.startup_delay())
        .await
        .context("Failed to start background worker")?
    {
        Detached::ParentDone => Ok(()),
        Detached::Worker => daemon::run_worker(config).await,
    }
}
