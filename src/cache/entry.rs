//! Cache Entry Module
//!
//! A shared holder for one tile payload. An entry starts life as a
//! placeholder inserted on a miss and becomes ready once its owner puts it.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{RwLock, RwLockReadGuard};

// == Tile Entry ==
/// A cached tile payload with size and usage metadata.
///
/// `size_bytes` is only meaningful once `is_ready()` returns true.
#[derive(Debug)]
pub struct TileEntry<P> {
    payload: RwLock<Option<Arc<P>>>,
    size_bytes: AtomicI64,
    /// Creation timestamp (Unix milliseconds)
    created_at: i64,
    /// Last successful lookup (Unix milliseconds)
    last_use_at: AtomicI64,
    ready: AtomicBool,
    claimed: AtomicBool,
}

impl<P> TileEntry<P> {
    // == Constructors ==
    /// Creates an empty, not-ready placeholder.
    pub fn placeholder() -> Self {
        Self::new_at(current_timestamp_ms())
    }

    /// Creates an entry already holding a payload, ready to be put.
    pub fn with_payload(payload: P) -> Self {
        let mut entry = Self::placeholder();
        *entry.payload.get_mut() = Some(Arc::new(payload));
        entry
    }

    pub(crate) fn new_at(now: i64) -> Self {
        Self {
            payload: RwLock::new(None),
            size_bytes: AtomicI64::new(0),
            created_at: now,
            last_use_at: AtomicI64::new(now),
            ready: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
        }
    }

    // == Payload ==
    /// Attaches the rendered payload. Size is measured later, on put.
    ///
    /// A ready entry is immutable: the payload is handed back and a
    /// replacement has to go through a fresh entry.
    pub fn set_payload(&self, payload: P) -> Result<Arc<P>, P> {
        let mut slot = self.payload.write();
        if self.is_ready() {
            return Err(payload);
        }
        let payload = Arc::new(payload);
        *slot = Some(Arc::clone(&payload));
        Ok(payload)
    }

    /// Returns the payload if one has been attached.
    pub fn payload(&self) -> Option<Arc<P>> {
        self.payload.read().clone()
    }

    /// Holds the payload steady while a put measures and admits it.
    pub(crate) fn read_payload(&self) -> RwLockReadGuard<'_, Option<Arc<P>>> {
        self.payload.read()
    }

    // == Ownership ==
    /// Claims the right to render this placeholder.
    ///
    /// Returns true for exactly one caller per entry.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    // == State ==
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub(crate) fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Size in bytes recorded when the entry was admitted; 0 for placeholders.
    pub fn size_bytes(&self) -> i64 {
        self.size_bytes.load(Ordering::Acquire)
    }

    pub(crate) fn set_size_bytes(&self, size: i64) {
        self.size_bytes.store(size, Ordering::Release);
    }

    pub fn created_at_ms(&self) -> i64 {
        self.created_at
    }

    pub fn last_use_at_ms(&self) -> i64 {
        self.last_use_at.load(Ordering::Acquire)
    }

    // == Touch ==
    pub(crate) fn touch_at(&self, now: i64) {
        self.last_use_at.store(now, Ordering::Release);
    }

    // == Is Expired ==
    /// An entry is expired once its age reaches `max_age_ms`.
    pub fn is_expired(&self, now: i64, max_age_ms: i64) -> bool {
        now - self.created_at >= max_age_ms
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
