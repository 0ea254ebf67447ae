//! # seatwatch
//!
//! Watches a booking endpoint for seats inside a departure-time window and
//! raises an alert when they appear.
//!
//! A background [`poller::Poller`] fetches the route's item list on a fixed
//! interval, records every successful result in a bounded
//! [`domain::HistoryStore`], and triggers a [`poller::Notifier`] when an item
//! departs strictly inside the configured window with seats left (or an
//! unknown count). The HTTP layer serves the latest filtered snapshot and the
//! retained history.
//!
//! ## Architecture
//!
//! ```text
//! Booking endpoint            Clients (HTTP)
//!     │                           │
//!     ├── HttpItemSource          ├── REST Handlers (api/)
//!     ├── Poller (poller/)        ├── HistoryService (service/)
//!     │     ├── detect            │
//!     │     └── Notifier          │
//!     │                           │
//!     └────────► HistoryStore (domain/) ◄────┘
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod poller;
pub mod service;
