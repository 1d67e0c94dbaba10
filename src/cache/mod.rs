//! Persistent validation cache
//!
//! Results are keyed by normalized link and expire after their ttl. The
//! cache only saves work; a cold cache produces the same report.

pub mod store;

pub use store::{CacheEntry, CacheStatus, CacheStore};
