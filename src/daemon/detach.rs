//! Re-launching the program as a detached background worker
//!
//! The parent spawns a copy of its own executable with [`DAEMON_ENV`] set and
//! returns to `main`, which exits normally so the log writer can flush. The
//! child sees the flag and runs the worker instead of spawning again.

use crate::errors::DaemonError;
use std::env;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::info;

/// Which side of the detach the caller ended up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detached {
    /// This process is the worker and should run it
    Worker,
    /// A worker was spawned; this process has nothing left to do
    ParentDone,
}

pub const DAEMON_ENV: &str = "CLAUDE_MONITOR_DAEMON";

/// True when this process is the detached worker
pub fn is_worker() -> bool {
    env::var(DAEMON_ENV).map(|v| v == "1").unwrap_or(false)
}

/// Launch the current executable as a detached worker and return its pid.
///
/// The child gets no standard streams and its own process group, so closing
/// the terminal or pressing Ctrl+C there does not reach it.
pub fn spawn_detached() -> Result<u32, DaemonError> {
    let executable = env::current_exe().map_err(DaemonError::ExecutablePath)?;

    let child = Command::new(&executable)
        .env(DAEMON_ENV, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(DaemonError::Spawn)?;

    let pid = child.id();
    info!(pid, executable = %executable.display(), "Spawned background worker");
    Ok(pid)
}

/// Make sure the worker runs detached.
///
/// Returns [`Detached::Worker`] immediately inside the worker. Anywhere else
/// it spawns the worker, gives it `startup_delay` to write its PID file and
/// returns [`Detached::ParentDone`].
pub async fn ensure_detached(startup_delay: Duration) -> Result<Detached, DaemonError> {
    if is_worker() {
        return Ok(Detached::Worker);
    }

    let pid = spawn_detached()?;

    println!("Claude Monitor Lite started in background (PID: {})", pid);
    println!("Run 'claude-monitor-lite status' to view usage.");
    println!("Run 'claude-monitor-lite stop' to stop it.");

    tokio::time::sleep(startup_delay).await;
    Ok(Detached::ParentDone)
}
