//! Last-known usage snapshot, shared between fetch tasks and the event loop
//!
//! Writers replace the whole snapshot; readers get an `Arc` to a complete
//! value. When fetches overlap, whichever finishes last wins, even if it
//! started first.

use crate::models::UsageSnapshot;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    slot: Arc<RwLock<Option<Arc<UsageSnapshot>>>>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot, or `None` before the first successful fetch
    pub fn get(&self) -> Option<Arc<UsageSnapshot>> {
        self.slot.read().clone()
    }

    pub fn set(&self, snapshot: Arc<UsageSnapshot>) {
        *self.slot.write() = Some(snapshot);
    }
}
