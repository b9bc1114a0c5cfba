//! Shared collaborators of the refresh scheduler

use super::cache::SharedCache;
use super::pid::PidGuard;
use crate::client::UsageSource;
use crate::session::ModeStore;
use std::sync::Arc;

/// Everything the scheduler and its fetch tasks touch.
///
/// Cloning is cheap; fetch tasks take their own copy.
#[derive(Clone)]
pub struct AppContext {
    pub source: Arc<dyn UsageSource>,
    pub cache: SharedCache,
    pub store: Arc<dyn ModeStore>,
    pub guard: Arc<PidGuard>,
}

impl AppContext {
    pub fn new(
        source: Arc<dyn UsageSource>,
        store: Arc<dyn ModeStore>,
        guard: Arc<PidGuard>,
    ) -> Self {
        Self {
            source,
            cache: SharedCache::new(),
            store,
            guard,
        }
    }
}
