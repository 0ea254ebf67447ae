//! A single timestamped poll result.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Item;

/// Items returned by one successful poll, stamped with the moment the
/// history store accepted them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Items in the order the booking endpoint returned them.
    pub items: Vec<Item>,
    /// Capture time, assigned on insertion into the store.
    pub moment: DateTime<Utc>,
}

impl Snapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(items: Vec<Item>, moment: DateTime<Utc>) -> Self {
        Self { items, moment }
    }

    /// Returns a copy keeping only items whose count is unknown or positive.
    #[must_use]
    pub fn available(&self) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.is_available())
                .cloned()
                .collect(),
            moment: self.moment,
        }
    }
}
