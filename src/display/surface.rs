//! Surfaces that present a [`MenuView`]
//!
//! The scheduler owns exactly one surface and is the only caller, so
//! implementations need no internal locking.

use super::MenuView;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub trait TraySurface {
    /// Replace whatever is shown with `view`
    fn render(&mut self, view: &MenuView);

    /// Tear the surface down; called once when the scheduler stops
    fn close(&mut self) {}
}

/// Headless surface used by the background worker.
///
/// Each render rewrites a small JSON file that `status` reads back. The file
/// is removed on close so a stale view never outlives the worker.
pub struct StatusFileSurface {
    path: PathBuf,
}

impl StatusFileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, view: &MenuView) -> Result<()> {
        let data = serde_json::to_string_pretty(view).context("Failed to serialize menu view")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so readers never see a half-written view
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl TraySurface for StatusFileSurface {
    fn render(&mut self, view: &MenuView) {
        match self.write(view) {
            Ok(()) => debug!(title = %view.title, "Rendered status view"),
            Err(e) => warn!(error = %e, "Failed to render status view"),
        }
    }

    fn close(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove status file"),
        }
    }
}

/// Read the last view written by a running worker
pub fn read_status_view(path: &Path) -> Option<MenuView> {
    let data = fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisplayMode;
    use tempfile::TempDir;

    #[test]
    fn test_render_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        let mut surface = StatusFileSurface::new(&path);

        let view = MenuView::loading(DisplayMode::WeeklyOpus);
        surface.render(&view);

        assert_eq!(read_status_view(&path), Some(view));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_close_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("status.json");
        let mut surface = StatusFileSurface::new(&path);

        surface.render(&MenuView::not_logged_in());
        assert!(path.exists());

        surface.close();
        assert!(!path.exists());
        assert_eq!(read_status_view(&path), None);

        // Closing twice is harmless
        surface.close();
    }
}
