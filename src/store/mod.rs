//! Storage is organized through [usage_store::UsageStore].
//! The basic idea is:
//!  - There are three top level records: usage per day, lifetime totals per domain and the set
//!    of domains with a hidden overlay.
//!  - Records are JSON documents kept in a [backend::KeyValueBackend].
//!  - Days are keyed by `YYYY-MM-DD` on the local calendar.

pub mod backend;
pub mod entities;
pub mod usage_store;
