//! Eviction Task
//!
//! Background task that drains the tile cache to its floor whenever a put
//! pushes the cache past its trigger size.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::{TileCache, Weigh};

/// Spawns the eviction worker for a cache.
///
/// The task sleeps until a put crosses the trigger size, clears the pending
/// request and runs one eviction pass on the blocking pool. A pass that
/// panics is logged and the worker keeps going. The task holds only a weak
/// reference, so it ends once the cache is dropped; abort the returned
/// handle to stop it earlier.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TileCache::<TilePayload>::new(CacheConfig::default()));
/// let eviction_handle = spawn_eviction_task(&cache);
/// // Later, during shutdown:
/// eviction_handle.abort();
/// ```
pub fn spawn_eviction_task<P>(cache: &Arc<TileCache<P>>) -> JoinHandle<()>
where
    P: Weigh + Send + Sync + 'static,
{
    let wake = cache.wake_signal();
    let cache = Arc::downgrade(cache);

    tokio::spawn(async move {
        info!("Starting tile cache eviction task");

        loop {
            wake.notified().await;

            let Some(cache) = cache.upgrade() else {
                info!("Tile cache dropped, eviction task stopping");
                break;
            };

            if !cache.take_clean_request() {
                debug!("Eviction task woken without a pending request");
                continue;
            }

            match tokio::task::spawn_blocking(move || cache.clean_cache()).await {
                Ok(report) => info!(
                    "Eviction pass: removed {} of {} tiles, freed {} bytes, cache size {}",
                    report.evicted, report.examined, report.freed_bytes, report.total_size
                ),
                Err(e) if e.is_panic() => {
                    error!("Tile cache eviction pass failed unexpectedly: {}", e);
                }
                Err(e) => {
                    warn!("Eviction pass cancelled, stopping: {}", e);
                    break;
                }
            }
        }
    })
}
