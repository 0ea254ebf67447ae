//! Service layer: the read-only facade used by HTTP handlers.
//!
//! [`HistoryService`] exposes the two history projections and the poller
//! counters. It never writes.

pub mod history_service;

pub use history_service::HistoryService;
