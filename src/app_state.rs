//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::HistoryService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only access to poll history.
    pub history_service: Arc<HistoryService>,
}
