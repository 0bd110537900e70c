//! Cache Module
//!
//! Provides the bounded tile cache with single-flight placeholders, lazy TTL
//! expiration and size-triggered LRU eviction.

mod entry;
mod eviction;
mod key;
mod payload;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, TileEntry};
pub use eviction::{plan_eviction, Candidate, EvictionPlan, EvictionReport};
pub use key::{CacheKey, PointResolution};
pub use payload::{TilePayload, Weigh};
pub use stats::CacheStats;
pub use store::{check_admission, Refusal, TileCache};
