//! Read-only access to poll history.

use std::sync::Arc;

use crate::domain::{HistoryStore, Snapshot};
use crate::poller::{PollStats, PollStatsSnapshot};

/// Pass-through over [`HistoryStore`] reads plus poller counters.
#[derive(Debug, Clone)]
pub struct HistoryService {
    store: Arc<HistoryStore>,
    stats: Arc<PollStats>,
}

impl HistoryService {
    /// Creates a new `HistoryService`.
    #[must_use]
    pub fn new(store: Arc<HistoryStore>, stats: Arc<PollStats>) -> Self {
        Self { store, stats }
    }

    /// Full retained history, oldest first.
    #[must_use]
    pub fn list_all(&self) -> Vec<Snapshot> {
        self.store.list_all()
    }

    /// Newest snapshot with depleted items removed.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot> {
        self.store.latest()
    }

    /// Number of retained snapshots.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.store.len()
    }

    /// Poller counters.
    #[must_use]
    pub fn stats(&self) -> PollStatsSnapshot {
        self.stats.snapshot()
    }
}
