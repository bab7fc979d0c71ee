//! Tracks how much time is spent actively viewing each website domain, keeps the history on
//! disk, and reports lifetime and calendar-bucketed usage for the on-page overlay.
//!

pub mod aggregation;
pub mod cli;
pub mod domain;
pub mod host;
pub mod store;
pub mod utils;
