use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use claude_monitor_lite::commands;
use claude_monitor_lite::config::Config;
use claude_monitor_lite::daemon;
use claude_monitor_lite::logging::{init_logging, LogTarget};
use claude_monitor_lite::models::DisplayMode;

#[derive(Parser)]
#[command(name = "claude-monitor-lite")]
#[command(about = "Lightweight background monitor for Claude usage limits")]
#[command(version)]
#[command(after_help = "First time? Just run: claude-monitor-lite")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop the monitor
    Stop,
    /// Clear session and stop monitor
    Logout,
    /// Show the running monitor and current usage
    Status,
    /// Ask the running monitor to refresh now
    Refresh,
    /// Choose which usage window the indicator shows
    Show {
        #[arg(value_enum)]
        mode: DisplayMode,
    },
    /// Watch usage in the terminal instead of the background
    #[cfg(feature = "tui")]
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => handle_error(e),
    };

    let worker = daemon::is_worker();
    let target = if worker {
        LogTarget::Daemon
    } else {
        LogTarget::Foreground
    };
    let _log_guard = init_logging(&config, target);

    let result = if worker {
        daemon::run_worker(&config).await
    } else {
        run_command(cli.command, &config).await
    };

    if let Err(e) = result {
        handle_error(e);
    }
}

async fn run_command(command: Option<Commands>, config: &Config) -> Result<()> {
    match command {
        None => commands::run_auto_start(config).await,
        Some(Commands::Stop) => commands::run_stop(config).await,
        Some(Commands::Logout) => commands::run_logout(config).await,
        Some(Commands::Status) => commands::run_status(config).await,
        Some(Commands::Refresh) => commands::run_refresh(config),
        Some(Commands::Show { mode }) => commands::run_show(config, mode),
        #[cfg(feature = "tui")]
        Some(Commands::Watch) => commands::run_watch(config).await,
    }
}

fn handle_error(e: anyhow::Error) -> ! {
    eprintln!("Error: {:#}", e);
    process::exit(1);
}
