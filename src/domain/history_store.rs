//! Bounded, reader/writer-locked history of poll snapshots.
//!
//! [`HistoryStore`] keeps the most recent [`HISTORY_CAPACITY`] snapshots in a
//! [`VecDeque`] behind a [`std::sync::RwLock`]. The poller is the only writer;
//! HTTP handlers read concurrently. Every operation is in-memory and never
//! awaits, so a blocking lock is appropriate here.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use super::{Item, Snapshot};

/// Number of snapshots retained.
pub const HISTORY_CAPACITY: usize = 20;

/// Bounded FIFO of [`Snapshot`]s, oldest first.
///
/// # Concurrency
///
/// - Any number of readers may run at once.
/// - [`HistoryStore::append`] takes the write lock, so readers see a snapshot
///   either fully appended (and the excess evicted) or not at all.
/// - Readers get owned copies, never references into the buffer.
#[derive(Debug)]
pub struct HistoryStore {
    snapshots: RwLock<VecDeque<Snapshot>>,
    capacity: usize,
}

impl HistoryStore {
    /// Creates an empty store holding up to [`HISTORY_CAPACITY`] snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Creates an empty store with a custom bound (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: RwLock::new(VecDeque::with_capacity(capacity.saturating_add(1))),
            capacity,
        }
    }

    /// Stores `items` as the newest snapshot and evicts the oldest ones
    /// beyond capacity. Returns a copy of the stored snapshot.
    ///
    /// The moment is the current wall-clock time, clamped so it never
    /// precedes the previous snapshot.
    pub fn append(&self, items: Vec<Item>) -> Snapshot {
        let mut snapshots = self.write();

        let now = Utc::now();
        let moment = snapshots
            .back()
            .map_or(now, |newest| now.max(newest.moment));

        let snapshot = Snapshot::new(items, moment);
        snapshots.push_back(snapshot.clone());
        while snapshots.len() > self.capacity {
            snapshots.pop_front();
        }
        snapshot
    }

    /// Returns a copy of the whole history, oldest first.
    #[must_use]
    pub fn list_all(&self) -> Vec<Snapshot> {
        self.read().iter().cloned().collect()
    }

    /// Returns the newest snapshot with depleted items (known count `<= 0`)
    /// removed, or `None` if nothing has been stored yet.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot> {
        self.read().back().map(Snapshot::available)
    }

    /// Returns the number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Returns the maximum number of retained snapshots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave the deque half-mutated
    // (push and pop are each atomic), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<Snapshot>> {
        self.snapshots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<Snapshot>> {
        self.snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}
