//! History response DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Count, Item, Snapshot};

/// One inventory line as served over HTTP.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemDto {
    /// Departure time, `YYYY-MM-DD HH:MM:SS`.
    pub departure_time: String,
    /// Remaining seats. Echoed as received; `null` or non-numeric means unknown.
    #[schema(value_type = Option<f64>)]
    pub count: Count,
    /// Display price.
    pub price: String,
}

impl From<&Item> for ItemDto {
    fn from(item: &Item) -> Self {
        Self {
            departure_time: item.departure_time.clone(),
            count: item.count.clone(),
            price: item.price.clone(),
        }
    }
}

/// A stored snapshot, as listed by `GET /list`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SnapshotDto {
    /// Items in source order.
    pub items: Vec<ItemDto>,
    /// Capture time (RFC 3339).
    pub moment: DateTime<Utc>,
}

impl From<&Snapshot> for SnapshotDto {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            items: snapshot.items.iter().map(ItemDto::from).collect(),
            moment: snapshot.moment,
        }
    }
}

/// Body of `GET /`: the newest snapshot with depleted items removed.
///
/// Before the first successful poll this is `{"items": [], "moment": null}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LatestSnapshotResponse {
    /// Items whose count is unknown or positive.
    pub items: Vec<ItemDto>,
    /// Capture time (RFC 3339), `null` when nothing has been polled yet.
    pub moment: Option<DateTime<Utc>>,
}

impl LatestSnapshotResponse {
    /// The "no data yet" body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            moment: None,
        }
    }
}

impl From<Snapshot> for LatestSnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            items: snapshot.items.iter().map(ItemDto::from).collect(),
            moment: Some(snapshot.moment),
        }
    }
}
