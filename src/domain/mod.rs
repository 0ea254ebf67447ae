//! Domain layer: inventory items, snapshots, the bounded history store, and
//! availability detection.
//!
//! Nothing in here performs I/O. The poller feeds decoded items into the
//! [`HistoryStore`] and runs [`detect`] over them; the HTTP layer only reads.

pub mod detector;
pub mod history_store;
pub mod item;
pub mod snapshot;

pub use detector::{Detection, DetectionWindow, detect};
pub use history_store::{HISTORY_CAPACITY, HistoryStore};
pub use item::{Count, DEPARTURE_TIME_FORMAT, Item};
pub use snapshot::Snapshot;
