//! Poller layer: fetching, the scheduling loop, and notification sinks.
//!
//! [`Poller`] is the single writer of the [`crate::domain::HistoryStore`].
//! It pulls items from an [`ItemSource`], runs detection, and hands hits to
//! a [`Notifier`] on a detached task.

pub mod fetcher;
pub mod notifier;
pub mod worker;

pub use fetcher::{HttpItemSource, ItemSource};
pub use notifier::{CommandNotifier, LogNotifier, Notifier};
pub use worker::{CycleReport, PollStats, PollStatsSnapshot, Poller, PollerSettings};
