//! Tile Cache - demo driver
//!
//! Loads the cache configuration, starts the cache with its eviction worker
//! and replays a burst of concurrent tile requests against it, printing the
//! resulting statistics as JSON.

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_cache::{CacheConfig, PointResolution, TileCache, TilePayload};

const DEFAULT_PROPERTIES: &str = "wms.properties";
const WORKERS: usize = 8;
const REQUESTS_PER_WORKER: usize = 200;
const QUERIES: [&str; 5] = [
    "taxon_name:Acacia",
    "taxon_name:Eucalyptus",
    "state:Victoria",
    "data_resource_uid:dr376",
    "*:*",
];
const COLOUR_MODES: [&str; 2] = ["-1", "grid"];

/// Main entry point for the tile cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from the properties file, then environment overrides
/// 3. Create the cache and start its eviction worker
/// 4. Replay concurrent tile requests through `get_or_compute`
/// 5. Print cache statistics and stop the worker
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tile_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tile cache demo");

    let path = env::var("TILE_CACHE_PROPERTIES").unwrap_or_else(|_| DEFAULT_PROPERTIES.to_string());
    let config = CacheConfig::load_or_default(&path).with_env_overrides();

    let (cache, eviction_handle) = TileCache::<TilePayload>::start(config);
    info!("Tile cache started");

    let started = Instant::now();
    let mut workers = Vec::with_capacity(WORKERS);
    for worker in 0..WORKERS {
        let cache = Arc::clone(&cache);
        workers.push(tokio::task::spawn_blocking(move || replay(&cache, worker)));
    }
    for worker in workers {
        worker.await.context("request worker failed")?;
    }
    info!("Replayed {} requests in {:?}", WORKERS * REQUESTS_PER_WORKER, started.elapsed());

    let stats = serde_json::to_string_pretty(&cache.stats()).context("cannot serialize stats")?;
    println!("{}", stats);

    eviction_handle.abort();
    info!("Tile cache demo complete");
    Ok(())
}

/// Issues one worker's share of requests, cycling through queries,
/// colour modes and resolutions.
fn replay(cache: &TileCache<TilePayload>, worker: usize) {
    for i in 0..REQUESTS_PER_WORKER {
        let query = QUERIES[(worker + i) % QUERIES.len()];
        let colour_mode = COLOUR_MODES[i % COLOUR_MODES.len()];
        let resolution = PointResolution::ALL[i % PointResolution::ALL.len()];

        let tile = cache.get_or_compute(query, colour_mode, resolution.label(), || {
            render(query, resolution)
        });
        debug_assert!(tile.point_count() > 0);
    }
}

/// Stands in for the search backend: produces a deterministic payload whose
/// size grows with the resolution.
fn render(query: &str, resolution: PointResolution) -> TilePayload {
    let points = match resolution.grid_size() {
        Some(grid) => ((1.0 / grid) as usize).clamp(1, 10_000),
        None => 20_000,
    } + query.len();

    let coords = (0..points)
        .flat_map(|p| [(p % 360) as f32 - 180.0, (p % 180) as f32 - 90.0])
        .collect();
    let colours = (0..points).map(|p| 0xff00_0000_u32 as i32 | p as i32).collect();

    TilePayload::new(coords, colours, None)
}
