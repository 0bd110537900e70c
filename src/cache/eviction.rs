//! Eviction Planning Module
//!
//! Decides which entries an eviction pass removes: entries are ordered from
//! least to most recently used and kept while the running size stays within
//! the floor. Everything past that point is evicted.

use serde::Serialize;

// == Candidate ==
/// One entry as seen by an eviction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<K> {
    pub key: K,
    pub size: i64,
    pub last_use_at: i64,
}

// == Plan ==
/// Keys an eviction pass keeps and evicts, both in LRU order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionPlan<K> {
    pub keep: Vec<K>,
    pub evict: Vec<K>,
    /// Sum of the kept sizes
    pub kept_size: i64,
}

/// Plans an eviction pass that leaves at most `floor` bytes.
///
/// Ties on `last_use_at` are broken by key so a given snapshot always yields
/// the same plan. Once one candidate overflows the floor, every more recently
/// used candidate is evicted as well.
pub fn plan_eviction<K: Ord>(mut candidates: Vec<Candidate<K>>, floor: i64) -> EvictionPlan<K> {
    candidates.sort_by(|a, b| {
        a.last_use_at
            .cmp(&b.last_use_at)
            .then_with(|| a.key.cmp(&b.key))
    });

    let mut keep = Vec::new();
    let mut evict = Vec::new();
    let mut kept_size = 0;
    let mut overflowed = false;

    for candidate in candidates {
        if !overflowed && kept_size + candidate.size <= floor {
            kept_size += candidate.size;
            keep.push(candidate.key);
        } else {
            overflowed = true;
            evict.push(candidate.key);
        }
    }

    EvictionPlan {
        keep,
        evict,
        kept_size,
    }
}

// == Report ==
/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvictionReport {
    /// Ready entries present in the snapshot
    pub examined: usize,
    /// Entries actually removed
    pub evicted: usize,
    /// Bytes released by the removed entries
    pub freed_bytes: i64,
    /// Accounted size after the pass, recomputed from survivors
    pub total_size: i64,
}
