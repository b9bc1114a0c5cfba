//! `status`: report on the running instance

use anyhow::{bail, Context, Result};
use colored::Colorize;

use super::NOT_RUNNING_MESSAGE;
use crate::client::ClaudeUsageClient;
use crate::config::Config;
use crate::daemon;
use crate::display::{print_usage_stats, read_status_view, round_utilization, UsageTier};
use crate::models::{DisplayMode, UsageSnapshot};
use crate::session::{ModeStore, SessionStore};

/// One line naming the window the indicator shows, e.g.
/// `Menu Bar Shows:  Weekly (All) (🟡 63%)`
pub fn indicator_summary(snapshot: &UsageSnapshot, mode: DisplayMode) -> String {
    let utilization = snapshot
        .window(mode.window())
        .map(|limit| limit.utilization)
        .unwrap_or(0.0);

    format!(
        "Menu Bar Shows:  {} ({} {}%)",
        mode.window().name(),
        UsageTier::from_utilization(utilization).indicator(),
        round_utilization(utilization)
    )
}

pub async fn run_status(config: &Config) -> Result<()> {
    let guard = daemon::pid_guard(config);
    if !guard.is_active() {
        println!("{}", NOT_RUNNING_MESSAGE);
        return Ok(());
    }

    if let Some(pid) = guard.read_pid() {
        println!("{}", format!("✓ Already running (PID: {})", pid).green());
        println!();
    }

    let store = SessionStore::new(&config.paths.session_file);
    let session = match store.load_session() {
        Ok(session) => session,
        Err(_) => bail!("Not authenticated. Run 'claude-monitor-lite logout' then restart."),
    };

    let client = ClaudeUsageClient::from_session(
        &session,
        config.monitor.api_base_url.as_str(),
        config.monitor.request_timeout(),
    )?;

    let snapshot = client.get_usage_limits().await.with_context(|| {
        "Failed to load usage data. Try running 'claude-monitor-lite logout' then restart."
    })?;

    print_usage_stats(&snapshot);
    println!("{}", indicator_summary(&snapshot, store.load_display_mode()));

    if let Some(view) = read_status_view(&config.paths.status_file) {
        println!("Indicator:       {}", view.title);
    }

    Ok(())
}
