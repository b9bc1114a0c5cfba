//! `refresh` and `show`: remote control of the running instance

use anyhow::{Context, Result};
use colored::Colorize;
use nix::sys::signal::Signal;
use tracing::info;

use super::NOT_RUNNING_MESSAGE;
use crate::config::Config;
use crate::daemon::{self, process};
use crate::models::DisplayMode;
use crate::session::{ModeStore, SessionStore};

/// Ask the running instance to fetch usage now
pub fn run_refresh(config: &Config) -> Result<()> {
    let guard = daemon::pid_guard(config);
    let Some(pid) = guard.is_active().then(|| guard.read_pid()).flatten() else {
        println!("{}", NOT_RUNNING_MESSAGE);
        return Ok(());
    };

    process::send_signal(pid, Signal::SIGUSR1)?;
    info!(pid, "Requested refresh");
    println!("{}", "✓ Refresh requested".green());
    Ok(())
}

/// Persist the indicator selection and tell the running instance to apply it
pub fn run_show(config: &Config, mode: DisplayMode) -> Result<()> {
    SessionStore::new(&config.paths.session_file)
        .save_display_mode(mode)
        .context("Failed to save display mode")?;
    println!(
        "{}",
        format!("✓ Menu bar will show {}", mode.window().name()).green()
    );

    let guard = daemon::pid_guard(config);
    if let Some(pid) = guard.is_active().then(|| guard.read_pid()).flatten() {
        process::send_signal(pid, Signal::SIGUSR2)?;
        info!(pid, mode = %mode, "Requested display mode reload");
    }
    Ok(())
}
