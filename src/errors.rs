//! Domain error types
//!
//! Fetch failures are classified so the scheduler can tell an expired session
//! apart from a transient problem. Daemon errors cover marker-file and
//! process-control failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("authentication failed - session may have expired (status {status})")]
    AuthFailed { status: u16 },

    #[error("session expired")]
    SessionExpired,

    #[error("organization ID not found in response")]
    OrganizationNotFound,

    #[error("unexpected status code {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// True when the stored session is no longer accepted
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            FetchError::AuthFailed { .. } | FetchError::SessionExpired
        )
    }
}

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to get executable path: {0}")]
    ExecutablePath(#[source] std::io::Error),

    #[error("failed to start background process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("PID file {}: {source}", path.display())]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PID: {0}")]
    InvalidPid(String),

    #[error("failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::errno::Errno,
    },
}
