//! Background Tasks Module
//!
//! Contains the background worker that runs for the lifetime of a cache.
//!
//! # Tasks
//! - Eviction: drains the cache to its floor whenever a put crosses the trigger size

mod eviction;

pub use eviction::spawn_eviction_task;
