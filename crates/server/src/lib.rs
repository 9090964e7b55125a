//! HTTP layer for the clipfetch service.

pub mod api;
pub mod metrics;
pub mod state;
