//! Destinations for decoded updates.

use crate::RealtimeUpdate;
use parking_lot::Mutex;

/// Receives every decoded inbound update.
///
/// Called on the connection's delivery path; implementations should hand
/// work off rather than block.
pub trait UpdateSink: Send + Sync {
    fn apply(&self, update: RealtimeUpdate);
}

/// Discards all updates.
#[derive(Debug, Default)]
pub struct NullSink;

impl UpdateSink for NullSink {
    fn apply(&self, _update: RealtimeUpdate) {}
}

/// Records all updates for testing.
#[derive(Debug, Default)]
pub struct RecordingSink {
    updates: Mutex<Vec<RealtimeUpdate>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded updates, oldest first.
    pub fn updates(&self) -> Vec<RealtimeUpdate> {
        self.updates.lock().clone()
    }

    pub fn clear(&self) {
        self.updates.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UpdateSink for RecordingSink {
    fn apply(&self, update: RealtimeUpdate) {
        self.updates.lock().push(update);
    }
}
