//! Liveness marker for single-instance enforcement
//!
//! The marker is a plain file holding the decimal process id of the active
//! background instance. Every invocation reads it to decide whether an
//! instance is already running; stale or unreadable markers are removed as
//! soon as they are noticed.
//!
//! Checking and claiming are two separate steps. Two instances launched at
//! nearly the same moment can both see "not active" and both claim; the
//! later claim simply overwrites the earlier one.

use super::process::ProcessProbe;
use crate::errors::DaemonError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PidGuard {
    path: PathBuf,
    probe: Arc<dyn ProcessProbe>,
}

impl PidGuard {
    pub fn new(path: impl Into<PathBuf>, probe: Arc<dyn ProcessProbe>) -> Self {
        Self {
            path: path.into(),
            probe,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the marker names a live process.
    ///
    /// A marker that cannot be parsed or that names a dead process is deleted
    /// before returning false.
    pub fn is_active(&self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return false,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read PID file");
                return false;
            }
        };

        let pid = match content.trim().parse::<u32>() {
            Ok(pid) => pid,
            Err(_) => {
                debug!(
                    path = %self.path.display(),
                    content = %content.trim(),
                    "Removing PID file with invalid content"
                );
                self.release();
                return false;
            }
        };

        if !self.probe.is_alive(pid) {
            debug!(pid, path = %self.path.display(), "Removing stale PID file");
            self.release();
            return false;
        }

        true
    }

    /// The recorded pid, without probing it
    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// Record this process as the active instance
    pub fn claim(&self) -> Result<(), DaemonError> {
        let pid = std::process::id();
        let io_err = |source| DaemonError::PidFile {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, pid.to_string()).map_err(io_err)?;

        debug!(pid, path = %self.path.display(), "PID file written");
        Ok(())
    }

    /// Remove the marker. Missing files are fine; other failures are logged.
    pub fn release(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "PID file removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove PID file"
            ),
        }
    }
}
