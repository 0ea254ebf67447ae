//! History handlers: latest filtered snapshot and full history.

use axum::Router;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::api::PrettyJson;
use crate::api::dto::{LatestSnapshotResponse, SnapshotDto};
use crate::app_state::AppState;

/// `GET /` — Newest snapshot without depleted items.
#[utoipa::path(
    get,
    path = "/",
    tag = "History",
    summary = "Latest snapshot",
    description = "Returns the most recent poll result with items whose known count is zero or less removed. Before the first successful poll, `items` is empty and `moment` is null.",
    responses(
        (status = 200, description = "Latest filtered snapshot", body = LatestSnapshotResponse),
    )
)]
pub async fn latest_handler(State(state): State<AppState>) -> impl IntoResponse {
    let response = state
        .history_service
        .latest()
        .map_or_else(LatestSnapshotResponse::empty, LatestSnapshotResponse::from);
    PrettyJson(response)
}

/// `GET /list` — Every retained snapshot, oldest first.
#[utoipa::path(
    get,
    path = "/list",
    tag = "History",
    summary = "Snapshot history",
    description = "Returns the retained poll results (at most 20), oldest first, unfiltered.",
    responses(
        (status = 200, description = "Bounded history", body = Vec<SnapshotDto>),
    )
)]
pub async fn list_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots: Vec<SnapshotDto> = state
        .history_service
        .list_all()
        .iter()
        .map(SnapshotDto::from)
        .collect();
    PrettyJson(snapshots)
}

/// History routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(latest_handler))
        .route("/list", get(list_handler))
}
