//! Tile Cache - A bounded in-process cache for rendered map tiles
//!
//! Deduplicates concurrent renders of the same tile and keeps the total
//! cached size within a configured budget using background LRU eviction.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheKey, PointResolution, TileCache, TileEntry, TilePayload};
pub use config::CacheConfig;
pub use tasks::spawn_eviction_task;
