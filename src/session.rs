//! Session and display-mode persistence
//!
//! Both the credentials and the selected indicator live in one JSON file:
//!
//! ```json
//! {
//!   "sessionKey": "sk-ant-...",
//!   "organizationId": "0d9c...",
//!   "savedAt": "2025-09-30T12:00:00Z",
//!   "menuBarIndicator": "weeklyAll"
//! }
//! ```
//!
//! Writers always read the current file first so that saving the mode keeps
//! the session and vice versa. Read-modify-write cycles are serialized within
//! the process, and every write goes to a temporary file that is renamed over
//! the target, so a concurrent reader sees either the old or the new file.
//! The file is created with mode 0600.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::DisplayMode;

/// Persists the indicator selection for the scheduler
pub trait ModeStore: Send + Sync {
    /// The stored mode, or the default when nothing usable is stored
    fn load_display_mode(&self) -> DisplayMode;

    fn save_display_mode(&self, mode: DisplayMode) -> Result<()>;
}

/// On-disk layout of the session file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub menu_bar_indicator: DisplayMode,
}

/// Credentials for the Claude web API
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub session_key: String,
    pub organization_id: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            organization_id: None,
            saved_at: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    /// Held across each load-modify-save; clones share it
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, falling back to defaults when it is missing or corrupt
    pub fn load(&self) -> StoredConfig {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return StoredConfig::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read session file");
                return StoredConfig::default();
            }
        };

        serde_json::from_str(&data).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Session file is corrupt, ignoring it");
            StoredConfig::default()
        })
    }

    pub fn save(&self, config: &StoredConfig) -> Result<()> {
        let _lock = self.write_lock.lock();
        self.write(config)
    }

    /// Apply `change` to the current contents and write the result back
    fn update(&self, change: impl FnOnce(&mut StoredConfig)) -> Result<()> {
        let _lock = self.write_lock.lock();
        let mut config = self.load();
        change(&mut config);
        self.write(&config)
    }

    fn write(&self, config: &StoredConfig) -> Result<()> {
        let data =
            serde_json::to_string_pretty(config).context("Failed to serialize session file")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Per-process name so another process saving at the same time
        // cannot clobber this temporary file
        let tmp = self
            .path
            .with_extension(format!("json.{}.tmp", process::id()));
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp)
            .with_context(|| format!("Failed to open {}", tmp.display()))?;
        file.write_all(data.as_bytes())
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        drop(file);

        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace session file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), "Session file saved");
        Ok(())
    }

    pub fn load_session(&self) -> Result<AuthSession> {
        let config = self.load();
        let session_key = config
            .session_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("no session found"))?;

        Ok(AuthSession {
            session_key,
            organization_id: config.organization_id.filter(|o| !o.is_empty()),
            saved_at: config.saved_at,
        })
    }

    /// Store credentials, stamping `saved_at` and keeping the selected mode
    pub fn save_session(&self, session: &mut AuthSession) -> Result<()> {
        session.saved_at = Some(Utc::now());

        self.update(|config| {
            config.session_key = Some(session.session_key.clone());
            config.organization_id = session.organization_id.clone();
            config.saved_at = session.saved_at;
        })
    }

    /// Remove the file entirely; a missing file is already clear
    pub fn clear(&self) -> Result<()> {
        let _lock = self.write_lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display())),
        }
    }
}

impl ModeStore for SessionStore {
    fn load_display_mode(&self) -> DisplayMode {
        self.load().menu_bar_indicator
    }

    fn save_display_mode(&self, mode: DisplayMode) -> Result<()> {
        self.update(|config| config.menu_bar_indicator = mode)
    }
}
