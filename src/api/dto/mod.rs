//! Data Transfer Objects for REST response serialization.

pub mod snapshot_dto;

pub use snapshot_dto::*;
