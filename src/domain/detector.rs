//! Availability detection over a decoded poll result.
//!
//! An item is a hit when its departure lies strictly inside the configured
//! [`DetectionWindow`] and its count is unknown or positive. Detection is
//! all-or-nothing: one malformed departure time rejects the whole snapshot.

use chrono::NaiveDateTime;

use super::Item;
use super::item::parse_departure_time;
use crate::error::PollError;

/// Open interval `(start, end)` of acceptable departure times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DetectionWindow {
    /// Creates a window from already parsed bounds.
    #[must_use]
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Parses both bounds from `YYYY-MM-DD HH:MM:SS` strings.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::InvalidTimestamp`] for the first bound that does
    /// not parse.
    pub fn parse(start: &str, end: &str) -> Result<Self, PollError> {
        Ok(Self::new(
            parse_departure_time(start)?,
            parse_departure_time(end)?,
        ))
    }

    /// Lower bound (exclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Upper bound (exclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Returns `true` if `time` lies strictly between the bounds.
    #[must_use]
    pub fn contains(&self, time: NaiveDateTime) -> bool {
        self.start < time && time < self.end
    }
}

/// Outcome of [`detect`]: the qualifying items, kept for logging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    matches: Vec<Item>,
}

impl Detection {
    /// Returns `true` if at least one item qualified.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Items that qualified, in source order.
    #[must_use]
    pub fn matches(&self) -> &[Item] {
        &self.matches
    }
}

/// Runs detection over `items`.
///
/// # Errors
///
/// Returns [`PollError::InvalidTimestamp`] if any item's departure time is
/// malformed, even when other items would have qualified.
pub fn detect(items: &[Item], window: &DetectionWindow) -> Result<Detection, PollError> {
    let mut matches = Vec::new();
    for item in items {
        let departure = item.departure()?;
        if window.contains(departure) && item.is_available() {
            matches.push(item.clone());
        }
    }
    Ok(Detection { matches })
}
