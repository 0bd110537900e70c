//! Tile Cache Module
//!
//! Main cache engine: a concurrent key/entry map with size accounting,
//! single-flight placeholders, lazy TTL expiry and size-triggered eviction.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::eviction::{plan_eviction, Candidate, EvictionReport};
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheKey, CacheStats, TileEntry, TilePayload, Weigh};
use crate::config::CacheConfig;
use crate::tasks::spawn_eviction_task;

// == Admission ==
/// Why a put was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    Disabled,
    Full,
    Oversize,
    WouldOverflow,
    NoPayload,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Refusal::Disabled => "cache disabled",
            Refusal::Full => "cache full",
            Refusal::Oversize => "payload too large to cache",
            Refusal::WouldOverflow => "payload would exceed max cache size",
            Refusal::NoPayload => "entry has no payload",
        };
        f.write_str(reason)
    }
}

/// Checks the admission rules in order against the current total.
pub fn check_admission(config: &CacheConfig, total_size: i64, size: i64) -> Result<(), Refusal> {
    if config.max_cache_size <= 0 {
        return Err(Refusal::Disabled);
    }
    if total_size >= config.max_cache_size {
        return Err(Refusal::Full);
    }
    if size >= config.largest_cacheable_size {
        return Err(Refusal::Oversize);
    }
    if total_size + size > config.max_cache_size {
        return Err(Refusal::WouldOverflow);
    }
    Ok(())
}

// == Tile Cache ==
/// Bounded concurrent cache of rendered tile payloads.
///
/// Share it through an `Arc`. `get`, `put` and `remove` are synchronous and
/// may be called from any thread; size reclamation happens on a background
/// task started by [`TileCache::start`].
pub struct TileCache<P = TilePayload> {
    entries: DashMap<CacheKey, Arc<TileEntry<P>>>,
    /// Accounted bytes of ready entries. Also guards the wake decision.
    total_size: Mutex<i64>,
    /// Serializes lookup, expiry and placeholder creation in `get`
    get_lock: Mutex<()>,
    sizing: RwLock<Arc<CacheConfig>>,
    clean_requested: AtomicBool,
    wake: Arc<Notify>,
    stats: StatsRecorder,
    #[cfg(test)]
    fail_next_pass: AtomicBool,
}

impl<P> TileCache<P>
where
    P: Weigh,
{
    // == Constructor ==
    /// Creates a cache without an eviction worker.
    pub fn new(config: CacheConfig) -> Self {
        info!(
            "Tile cache created: max={} min={} largest={} max_age={}ms trigger={}",
            config.max_cache_size,
            config.min_cache_size,
            config.largest_cacheable_size,
            config.max_age_ms,
            config.trigger_clean_size()
        );
        Self {
            entries: DashMap::new(),
            total_size: Mutex::new(0),
            get_lock: Mutex::new(()),
            sizing: RwLock::new(Arc::new(config)),
            clean_requested: AtomicBool::new(false),
            wake: Arc::new(Notify::new()),
            stats: StatsRecorder::default(),
            #[cfg(test)]
            fail_next_pass: AtomicBool::new(false),
        }
    }

    /// Creates a shared cache and spawns its eviction worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: CacheConfig) -> (Arc<Self>, JoinHandle<()>)
    where
        P: Send + Sync + 'static,
    {
        let cache = Arc::new(Self::new(config));
        let handle = spawn_eviction_task(&cache);
        (cache, handle)
    }

    // == Get ==
    /// Returns the entry for a request, never nothing.
    ///
    /// A ready entry, or a placeholder someone else is filling, is returned
    /// as is. Otherwise a new placeholder is inserted and returned; the
    /// caller should `try_claim` it, render, attach the payload and `put` it.
    pub fn get(&self, query: &str, colour_mode: &str, resolution: &str) -> Arc<TileEntry<P>> {
        self.get_by_key(&CacheKey::new(query, colour_mode, resolution))
    }

    pub fn get_by_key(&self, key: &CacheKey) -> Arc<TileEntry<P>> {
        let max_age_ms = self.config().max_age_ms;
        let now = current_timestamp_ms();
        let _guard = self.get_lock.lock();

        let existing = self.entries.get(key).map(|e| Arc::clone(e.value()));
        if let Some(expired) = existing.filter(|e| e.is_expired(now, max_age_ms)) {
            if self.remove_entry(key, Some(&expired)).is_some() {
                self.stats.record_expiration();
                debug!("expired tile {} after {}ms", key, now - expired.created_at_ms());
            }
        }

        let entry = match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                self.stats.record_hit();
                Arc::clone(occupied.get())
            }
            Entry::Vacant(vacant) => {
                self.stats.record_miss();
                Arc::clone(vacant.insert(Arc::new(TileEntry::new_at(now))).value())
            }
        };

        entry.touch_at(now);
        entry
    }

    // == Put ==
    /// Admits a filled entry, measuring its payload.
    ///
    /// Returns false, changing nothing, when the cache is disabled or full,
    /// the payload is too large, or it would push the cache past its ceiling.
    pub fn put(
        &self,
        query: &str,
        colour_mode: &str,
        resolution: &str,
        entry: &Arc<TileEntry<P>>,
    ) -> bool {
        self.put_by_key(CacheKey::new(query, colour_mode, resolution), entry)
    }

    pub fn put_by_key(&self, key: CacheKey, entry: &Arc<TileEntry<P>>) -> bool {
        let config = self.config();
        // the payload read guard lives until the end of this statement
        let result = match entry.read_payload().as_ref() {
            Some(payload) => self.admit(&config, key.clone(), entry, payload.weight()),
            None => Err(Refusal::NoPayload),
        };

        self.stats.record_admission(result.is_ok());
        match result {
            Ok(total) => {
                debug!(
                    "cached tile {} ({} bytes), new cache size: {}",
                    key,
                    entry.size_bytes(),
                    total
                );
                true
            }
            Err(refusal) => {
                debug!("not caching tile {}: {}", key, refusal);
                false
            }
        }
    }

    fn admit(
        &self,
        config: &CacheConfig,
        key: CacheKey,
        entry: &Arc<TileEntry<P>>,
        size: i64,
    ) -> Result<i64, Refusal> {
        let mut total = self.total_size.lock();
        check_admission(config, *total, size)?;

        if let Some(previous) = self.entries.insert(key, Arc::clone(entry)) {
            if previous.is_ready() {
                *total -= previous.size_bytes();
            }
        }
        entry.set_size_bytes(size);
        entry.mark_ready();
        *total += size;

        if *total >= config.trigger_clean_size() {
            self.request_clean();
        }
        Ok(*total)
    }

    /// Wakes the eviction worker unless a wake is already pending.
    fn request_clean(&self) {
        if !self.clean_requested.swap(true, Ordering::AcqRel) {
            self.wake.notify_one();
        }
    }

    // == Remove ==
    /// Removes the entry for a request, if any.
    pub fn remove(&self, query: &str, colour_mode: &str, resolution: &str) {
        let key = CacheKey::new(query, colour_mode, resolution);
        if self.remove_entry(&key, None).is_some() {
            debug!("removed tile {}", key);
        }
    }

    /// Removes `key`, or only if it still maps to `expected`, and releases
    /// its size in the same step.
    fn remove_entry(
        &self,
        key: &CacheKey,
        expected: Option<&Arc<TileEntry<P>>>,
    ) -> Option<Arc<TileEntry<P>>> {
        let mut total = self.total_size.lock();
        let removed = match expected {
            Some(expected) => self
                .entries
                .remove_if(key, |_, current| Arc::ptr_eq(current, expected)),
            None => self.entries.remove(key),
        };

        removed.map(|(_, entry)| {
            if entry.is_ready() {
                *total -= entry.size_bytes();
            }
            entry
        })
    }

    // == Get Or Compute ==
    /// Returns the cached payload, or renders it with `compute`.
    ///
    /// Only the caller that claims a placeholder caches its result; callers
    /// that find a placeholder claimed by someone else render uncached.
    pub fn get_or_compute<F>(
        &self,
        query: &str,
        colour_mode: &str,
        resolution: &str,
        compute: F,
    ) -> Arc<P>
    where
        F: FnOnce() -> P,
    {
        let key = CacheKey::new(query, colour_mode, resolution);
        let entry = self.get_by_key(&key);

        if entry.is_ready() {
            if let Some(payload) = entry.payload() {
                return payload;
            }
        }

        if !entry.try_claim() {
            return Arc::new(compute());
        }

        let payload = match entry.set_payload(compute()) {
            Ok(payload) => payload,
            Err(rendered) => return Arc::new(rendered),
        };
        if !self.put_by_key(key.clone(), &entry) {
            self.remove_entry(&key, Some(&entry));
        }
        payload
    }

    // == Eviction ==
    /// Drains the cache to at most the floor, keeping least recently used
    /// entries first and evicting everything after the first overflow.
    ///
    /// Works on a snapshot of ready entries: entries inserted or replaced
    /// after the snapshot are never removed by this pass.
    pub fn clean_cache(&self) -> EvictionReport {
        #[cfg(test)]
        if self.fail_next_pass.swap(false, Ordering::AcqRel) {
            panic!("eviction pass failed");
        }

        let snapshot = self.ready_snapshot();
        self.evict_from(snapshot)
    }

    fn ready_snapshot(&self) -> HashMap<CacheKey, Arc<TileEntry<P>>> {
        self.entries
            .iter()
            .filter(|e| e.value().is_ready())
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }

    /// Plans against `snapshot` and removes only the keys that still map to
    /// the snapshotted entry.
    fn evict_from(&self, snapshot: HashMap<CacheKey, Arc<TileEntry<P>>>) -> EvictionReport {
        let floor = self.config().min_cache_size;

        let candidates = snapshot
            .iter()
            .map(|(key, entry)| Candidate {
                key: key.clone(),
                size: entry.size_bytes(),
                last_use_at: entry.last_use_at_ms(),
            })
            .collect();
        let plan = plan_eviction(candidates, floor);

        let mut evicted = 0;
        let mut freed_bytes = 0;
        for key in &plan.evict {
            let Some(expected) = snapshot.get(key) else {
                continue;
            };
            if let Some(entry) = self.remove_entry(key, Some(expected)) {
                evicted += 1;
                freed_bytes += entry.size_bytes();
            }
        }

        let total_size = self.recompute_total();
        self.stats.record_evictions(evicted as u64);
        debug!("removed {} cached tiles, new cache size {}", evicted, total_size);

        EvictionReport {
            examined: snapshot.len(),
            evicted,
            freed_bytes,
            total_size,
        }
    }

    /// Resets the accounted size to the sum of the ready entries present.
    fn recompute_total(&self) -> i64 {
        let mut total = self.total_size.lock();
        *total = self
            .entries
            .iter()
            .filter(|e| e.value().is_ready())
            .map(|e| e.value().size_bytes())
            .sum();
        *total
    }

    /// Sum of the sizes of every entry physically present.
    #[cfg(test)]
    pub(crate) fn stored_size(&self) -> i64 {
        self.entries.iter().map(|e| e.value().size_bytes()).sum()
    }

    /// Makes the next `clean_cache` call panic.
    #[cfg(test)]
    pub(crate) fn fail_next_pass(&self) {
        self.fail_next_pass.store(true, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn pass_failure_pending(&self) -> bool {
        self.fail_next_pass.load(Ordering::Acquire)
    }

    pub(crate) fn wake_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    /// Clears the pending wake, returning whether one was set.
    pub(crate) fn take_clean_request(&self) -> bool {
        self.clean_requested.swap(false, Ordering::AcqRel)
    }

    // == Empty ==
    /// Drops every entry and resets the accounting and any pending wake.
    pub fn empty(&self) {
        let mut total = self.total_size.lock();
        self.entries.clear();
        *total = 0;
        self.clean_requested.store(false, Ordering::Release);
        info!("tile cache emptied");
    }

    // == State ==
    pub fn is_enabled(&self) -> bool {
        self.config().max_cache_size > 0
    }

    /// All puts fail while the cache is full.
    pub fn is_full(&self) -> bool {
        *self.total_size.lock() >= self.config().max_cache_size
    }

    /// Whether a payload of `size` bytes could ever be admitted.
    pub fn is_cachable(&self, size: i64) -> bool {
        size < self.config().largest_cacheable_size
    }

    /// Accounted size in bytes.
    pub fn size(&self) -> i64 {
        *self.total_size.lock()
    }

    /// Number of entries, placeholders included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len(), self.size())
    }

    // == Configuration ==
    /// Current sizing snapshot.
    pub fn config(&self) -> Arc<CacheConfig> {
        self.sizing.read().clone()
    }

    pub fn max_cache_size(&self) -> i64 {
        self.config().max_cache_size
    }

    pub fn min_cache_size(&self) -> i64 {
        self.config().min_cache_size
    }

    pub fn largest_cacheable_size(&self) -> i64 {
        self.config().largest_cacheable_size
    }

    pub fn max_age(&self) -> Duration {
        self.config().max_age()
    }

    pub fn trigger_clean_size(&self) -> i64 {
        self.config().trigger_clean_size()
    }

    /// Sets the ceiling. Takes effect on the next put; nothing is evicted now.
    pub fn set_max_cache_size(&self, size_in_bytes: i64) {
        self.update_config(|c| c.max_cache_size = size_in_bytes);
    }

    /// Sets the floor. Takes effect on the next eviction pass.
    pub fn set_min_cache_size(&self, size_in_bytes: i64) {
        self.update_config(|c| c.min_cache_size = size_in_bytes);
    }

    pub fn set_largest_cacheable_size(&self, size_in_bytes: i64) {
        self.update_config(|c| c.largest_cacheable_size = size_in_bytes);
    }

    pub fn set_max_age(&self, max_age: Duration) {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        self.update_config(|c| c.max_age_ms = max_age_ms);
    }

    fn update_config(&self, update: impl FnOnce(&mut CacheConfig)) {
        let mut sizing = self.sizing.write();
        let mut next = CacheConfig::clone(&sizing);
        update(&mut next);
        debug!(
            "trigger_clean_size={} min_cache_size={} max_cache_size={}",
            next.trigger_clean_size(),
            next.min_cache_size,
            next.max_cache_size
        );
        *sizing = Arc::new(next);
    }
}

impl<P> Drop for TileCache<P> {
    fn drop(&mut self) {
        // lets a waiting eviction worker observe the drop and exit
        self.wake.notify_one();
    }
}

impl<P> fmt::Debug for TileCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCache")
            .field("entries", &self.entries.len())
            .field("total_size", &*self.total_size.lock())
            .field("sizing", &*self.sizing.read())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn config(max: i64, min: i64, largest: i64) -> CacheConfig {
        CacheConfig {
            max_cache_size: max,
            min_cache_size: min,
            largest_cacheable_size: largest,
            max_age_ms: 3_600_000,
        }
    }

    fn small_cache() -> TileCache<Vec<u8>> {
        TileCache::new(config(100, 50, 90))
    }

    fn fill(
        cache: &TileCache<Vec<u8>>,
        query: &str,
        size: usize,
    ) -> (Arc<TileEntry<Vec<u8>>>, bool) {
        let entry = cache.get(query, "-1", "point-1");
        assert!(entry.set_payload(vec![0u8; size]).is_ok());
        let admitted = cache.put(query, "-1", "point-1", &entry);
        (entry, admitted)
    }

    #[test]
    fn test_admission_order() {
        let c = config(100, 50, 90);
        assert_eq!(check_admission(&config(0, 0, 90), 0, 1), Err(Refusal::Disabled));
        assert_eq!(check_admission(&c, 100, 1), Err(Refusal::Full));
        assert_eq!(check_admission(&c, 0, 90), Err(Refusal::Oversize));
        assert_eq!(check_admission(&c, 60, 50), Err(Refusal::WouldOverflow));
        assert_eq!(check_admission(&c, 60, 40), Ok(()));
    }

    #[test]
    fn test_get_miss_creates_placeholder() {
        let cache = small_cache();

        let entry = cache.get("q", "-1", "point-1");
        assert!(!entry.is_ready());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.size(), 0);

        let again = cache.get("q", "-1", "point-1");
        assert!(Arc::ptr_eq(&entry, &again));

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_put_marks_ready_and_accounts() {
        let cache = small_cache();

        let (entry, admitted) = fill(&cache, "a", 30);
        assert!(admitted);
        assert!(entry.is_ready());
        assert_eq!(entry.size_bytes(), 30);
        assert_eq!(cache.size(), 30);

        let found = cache.get("a", "-1", "point-1");
        assert!(Arc::ptr_eq(&entry, &found));
        assert_eq!(found.payload().map(|p| p.len()), Some(30));
    }

    #[test]
    fn test_put_without_payload_rejected() {
        let cache = small_cache();
        let entry = cache.get("a", "-1", "point-1");

        assert!(!cache.put("a", "-1", "point-1", &entry));
        assert!(!entry.is_ready());
        assert_eq!(cache.stats().rejected, 1);
    }

    #[test]
    fn test_oversize_rejected() {
        let cache = small_cache();

        let (entry, admitted) = fill(&cache, "big", 90);
        assert!(!admitted);
        assert!(!entry.is_ready());
        assert_eq!(entry.size_bytes(), 0);
        assert_eq!(cache.size(), 0);
        assert!(!cache.is_cachable(90));
        assert!(cache.is_cachable(89));
    }

    #[test]
    fn test_overflow_rejected() {
        let cache = small_cache();

        assert!(fill(&cache, "a", 30).1);
        assert!(fill(&cache, "b", 30).1);
        assert!(!fill(&cache, "c", 50).1);
        assert_eq!(cache.size(), 60);
    }

    #[test]
    fn test_full_cache_rejects_everything() {
        let cache = small_cache();

        assert!(fill(&cache, "a", 60).1);
        assert!(fill(&cache, "b", 40).1);
        assert!(cache.is_full());
        assert!(!fill(&cache, "c", 1).1);
    }

    #[test]
    fn test_disabled_cache() {
        let cache: TileCache<Vec<u8>> = TileCache::new(config(0, 0, 90));

        assert!(!cache.is_enabled());
        assert!(!fill(&cache, "a", 1).1);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_put_replaces_ready_entry() {
        let cache = small_cache();

        fill(&cache, "a", 30);
        let replacement = Arc::new(TileEntry::with_payload(vec![0u8; 10]));
        assert!(cache.put("a", "-1", "point-1", &replacement));

        assert_eq!(cache.size(), 10);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stored_size(), cache.size());
    }

    #[test]
    fn test_served_entry_refuses_new_payload() {
        let cache = small_cache();
        fill(&cache, "a", 30);

        let served = cache.get("a", "-1", "point-1");
        assert!(served.set_payload(vec![0u8; 95]).is_err());
        assert!(cache.put("a", "-1", "point-1", &served));

        let again = cache.get("a", "-1", "point-1");
        assert_eq!(again.payload().map(|p| p.len()), Some(30));
        assert_eq!(again.size_bytes(), 30);
        assert_eq!(cache.size(), 30);
        assert_eq!(cache.stored_size(), cache.size());
    }

    #[test]
    fn test_remove_releases_size() {
        let cache = small_cache();

        fill(&cache, "a", 30);
        fill(&cache, "b", 20);
        cache.remove("a", "-1", "point-1");
        cache.remove("missing", "-1", "point-1");

        assert_eq!(cache.size(), 20);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_replacement() {
        let cache = small_cache();
        cache.set_max_age(Duration::from_millis(20));

        let (expired, _) = fill(&cache, "a", 30);
        sleep(Duration::from_millis(40));

        let fresh = cache.get("a", "-1", "point-1");
        assert!(!Arc::ptr_eq(&expired, &fresh));
        assert!(!fresh.is_ready());
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().expirations, 1);

        let again = cache.get("a", "-1", "point-1");
        assert!(Arc::ptr_eq(&fresh, &again));
    }

    #[test]
    fn test_trigger_requests_clean_once() {
        let cache = small_cache();

        fill(&cache, "a", 30);
        fill(&cache, "b", 30);
        assert!(!cache.take_clean_request());

        fill(&cache, "c", 20);
        fill(&cache, "d", 5);
        assert!(cache.take_clean_request());
        assert!(!cache.take_clean_request());
    }

    #[test]
    fn test_trigger_fires_at_exact_threshold() {
        let cache = small_cache();

        fill(&cache, "a", 40);
        fill(&cache, "b", 34);
        assert_eq!(cache.size(), 74);
        assert!(!cache.take_clean_request());

        fill(&cache, "c", 1);
        assert_eq!(cache.size(), cache.trigger_clean_size());
        assert!(cache.take_clean_request());
    }

    #[test]
    fn test_clean_cache_scenario() {
        let cache = small_cache();

        let (a, _) = fill(&cache, "a", 30);
        let (b, _) = fill(&cache, "b", 30);
        let (d, _) = fill(&cache, "d", 20);
        a.touch_at(1);
        b.touch_at(2);
        d.touch_at(3);

        let report = cache.clean_cache();
        assert_eq!(report.examined, 3);
        assert_eq!(report.evicted, 2);
        assert_eq!(report.freed_bytes, 50);
        assert_eq!(report.total_size, 30);
        assert_eq!(cache.size(), 30);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("a", "-1", "point-1"), &a));
    }

    #[test]
    fn test_entry_replaced_after_snapshot_survives() {
        let cache = small_cache();

        let (a, _) = fill(&cache, "a", 30);
        let (b, _) = fill(&cache, "b", 30);
        let (d, _) = fill(&cache, "d", 20);
        a.touch_at(1);
        b.touch_at(2);
        d.touch_at(3);

        let snapshot = cache.ready_snapshot();
        let replacement = Arc::new(TileEntry::with_payload(vec![0u8; 15]));
        assert!(cache.put("b", "-1", "point-1", &replacement));

        let report = cache.evict_from(snapshot);
        assert_eq!(report.evicted, 1);
        assert_eq!(report.freed_bytes, 20);
        assert_eq!(report.total_size, 45);
        assert_eq!(cache.size(), 45);
        assert_eq!(cache.stored_size(), cache.size());
        assert!(Arc::ptr_eq(&cache.get("b", "-1", "point-1"), &replacement));
    }

    #[test]
    fn test_clean_cache_skips_placeholders() {
        let cache = small_cache();

        fill(&cache, "a", 40);
        fill(&cache, "b", 40);
        let pending = cache.get("pending", "-1", "point-1");
        cache.set_min_cache_size(0);

        cache.clean_cache();
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("pending", "-1", "point-1"), &pending));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_empty_resets() {
        let cache = small_cache();

        fill(&cache, "a", 60);
        fill(&cache, "b", 20);
        cache.empty();

        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
        assert!(!cache.take_clean_request());
    }

    #[test]
    fn test_setters_recompute_trigger() {
        let cache = small_cache();
        assert_eq!(cache.trigger_clean_size(), 75);

        cache.set_max_cache_size(200);
        assert_eq!(cache.trigger_clean_size(), 125);
        cache.set_min_cache_size(100);
        assert_eq!(cache.trigger_clean_size(), 150);
        cache.set_largest_cacheable_size(10);
        assert_eq!(cache.largest_cacheable_size(), 10);
        assert_eq!(cache.max_cache_size(), 200);
        assert_eq!(cache.min_cache_size(), 100);
    }

    #[test]
    fn test_shrinking_ceiling_does_not_evict() {
        let cache = small_cache();

        fill(&cache, "a", 60);
        cache.set_max_cache_size(10);

        assert_eq!(cache.len(), 1);
        assert!(cache.is_full());
    }

    #[test]
    fn test_get_or_compute_caches_once() {
        let cache = small_cache();

        let first = cache.get_or_compute("q", "-1", "point-1", || vec![7u8; 10]);
        let second = cache.get_or_compute("q", "-1", "point-1", || -> Vec<u8> { unreachable!() });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.size(), 10);
    }

    #[test]
    fn test_get_or_compute_rejected_removes_placeholder() {
        let cache = small_cache();

        let payload = cache.get_or_compute("big", "-1", "point-1", || vec![0u8; 95]);

        assert_eq!(payload.len(), 95);
        assert!(cache.is_empty());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_get_or_compute_claimed_elsewhere_renders_uncached() {
        let cache = small_cache();

        let owned = cache.get("q", "-1", "point-1");
        assert!(owned.try_claim());

        let payload = cache.get_or_compute("q", "-1", "point-1", || vec![1u8; 5]);
        assert_eq!(payload.len(), 5);
        assert!(!owned.is_ready());
        assert_eq!(cache.size(), 0);
    }
}
