use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Frame counters for one sync client.
///
/// Cheap to clone; clones share the same counters so a caller can keep a
/// handle while the client owns the reconciler.
#[derive(Clone, Debug, Default)]
pub struct SyncStats {
    frames: Arc<AtomicU64>,
    applied: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    malformed: Arc<AtomicU64>,
    unknown: Arc<AtomicU64>,
}

/// Point-in-time copy of [`SyncStats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames: u64,
    pub applied: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub unknown: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame handed to the decoder
    pub fn record_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Frame decoded and applied
    pub fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Frame discarded before decoding (stale or non-open session)
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_unknown(&self) {
        self.unknown.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
        }
    }
}
