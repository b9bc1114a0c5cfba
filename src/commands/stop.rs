//! `stop` and `logout`

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::io::ErrorKind;
use tracing::{info, warn};

use super::NOT_RUNNING_MESSAGE;
use crate::config::Config;
use crate::daemon::{self, process, PidGuard};
use crate::errors::DaemonError;
use crate::session::SessionStore;

/// Stop the running instance
pub async fn run_stop(config: &Config) -> Result<()> {
    let guard = daemon::pid_guard(config);
    if !guard.is_active() {
        println!("{}", NOT_RUNNING_MESSAGE);
        return Ok(());
    }

    let pid = terminate_active(&guard)?;
    println!("Claude Monitor Lite (PID: {}) stopped.", pid);

    tokio::time::sleep(config.monitor.stop_wait()).await;
    guard.release();
    Ok(())
}

/// Stop the running instance if any, then remove all stored data
pub async fn run_logout(config: &Config) -> Result<()> {
    let guard = daemon::pid_guard(config);
    if guard.is_active() {
        println!("Stopping monitor...");
        match terminate_active(&guard) {
            Ok(_) => tokio::time::sleep(config.monitor.stop_wait()).await,
            Err(e) => warn!(error = %e, "Failed to stop monitor during logout"),
        }
        guard.release();
    }

    SessionStore::new(&config.paths.session_file)
        .clear()
        .context("Failed to clear session")?;

    match fs::remove_file(&config.paths.status_file) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "Failed to remove status file"),
    }

    info!("Logged out");
    println!("{}", "✓ Logged out! All config and session data removed.".green());
    Ok(())
}

fn terminate_active(guard: &PidGuard) -> Result<u32, DaemonError> {
    let pid = guard
        .read_pid()
        .ok_or_else(|| DaemonError::InvalidPid(guard.path().display().to_string()))?;
    process::terminate(pid)?;
    info!(pid, "Sent SIGTERM");
    Ok(pid)
}
