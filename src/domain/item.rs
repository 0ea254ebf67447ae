//! Inventory line as reported by the booking endpoint.
//!
//! The remote payload is a JSON array of objects shaped like
//! `{"departure_time": "2025-01-01 11:00:00", "count": 3, "price": "12.50"}`.
//! `count` is loosely typed upstream: it may be missing, `null`, a number or
//! something else entirely. [`Count`] captures that as a tagged variant.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PollError;

/// Layout of every timestamp exchanged with the booking endpoint and of the
/// configured detection window bounds.
pub const DEPARTURE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// # Errors
///
/// Returns [`PollError::InvalidTimestamp`] if `value` does not match
/// [`DEPARTURE_TIME_FORMAT`] exactly.
pub fn parse_departure_time(value: &str) -> Result<NaiveDateTime, PollError> {
    NaiveDateTime::parse_from_str(value, DEPARTURE_TIME_FORMAT).map_err(|source| {
        PollError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

/// Remaining quantity of an item.
///
/// Anything that is not a JSON number is [`Count::Unknown`] and is treated as
/// "assume available". The raw JSON value is kept so the query endpoints can
/// echo it back untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Count {
    /// Missing, `null`, or not a number.
    Unknown(serde_json::Value),
    /// A decodable number.
    Number(serde_json::Number),
}

impl Count {
    /// Creates a known integer count.
    #[must_use]
    pub fn number(value: i64) -> Self {
        Self::Number(value.into())
    }

    /// Returns `true` when the item may still be purchasable: the count is
    /// unknown or strictly positive.
    #[must_use]
    pub fn is_available(&self) -> bool {
        match self {
            Self::Unknown(_) => true,
            Self::Number(n) => n.as_f64().is_some_and(|v| v > 0.0),
        }
    }

    /// Returns the numeric value, if the count is known.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Unknown(_) => None,
            Self::Number(n) => n.as_f64(),
        }
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "{raw}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Default for Count {
    fn default() -> Self {
        Self::Unknown(serde_json::Value::Null)
    }
}

impl From<serde_json::Value> for Count {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => Self::Number(n),
            other => Self::Unknown(other),
        }
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unknown(raw) => raw.serialize(serializer),
            Self::Number(n) => n.serialize(serializer),
        }
    }
}

/// One inventory line (a departure with its remaining seats and price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Departure time in `YYYY-MM-DD HH:MM:SS` form, kept verbatim.
    pub departure_time: String,
    /// Remaining quantity.
    #[serde(default)]
    pub count: Count,
    /// Display price, not interpreted.
    #[serde(default)]
    pub price: String,
}

impl Item {
    /// Creates an item.
    #[must_use]
    pub fn new(departure_time: impl Into<String>, count: Count, price: impl Into<String>) -> Self {
        Self {
            departure_time: departure_time.into(),
            count,
            price: price.into(),
        }
    }

    /// Parses [`Item::departure_time`].
    ///
    /// # Errors
    ///
    /// Returns [`PollError::InvalidTimestamp`] if the field does not match
    /// [`DEPARTURE_TIME_FORMAT`].
    pub fn departure(&self) -> Result<NaiveDateTime, PollError> {
        parse_departure_time(&self.departure_time)
    }

    /// Returns `true` when [`Item::count`] is unknown or positive.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.count.is_available()
    }
}
