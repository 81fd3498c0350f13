//! Shared health state for the /health endpoint.
//! Updated by the API handlers, DbWriter and HandicapRefresher.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared health counters. Updated by league components, read by API.
#[derive(Debug, Default)]
pub struct HealthState {
    /// Rounds accepted since startup.
    pub rounds_submitted: AtomicU64,
    /// Matches persisted since startup.
    pub matches_recorded: AtomicU64,
    /// Approximate count of events queued for DB write.
    pub write_queue_pending: AtomicU64,
    /// Nanosecond timestamp of the last completed handicap refresh (0 = none).
    pub last_refresh_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_rounds_submitted(&self) {
        self.rounds_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_matches_recorded(&self) {
        self.matches_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_write_queue_pending(&self) {
        self.write_queue_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_write_queue_pending(&self) {
        // Saturate at zero; the counter is approximate.
        let _ = self
            .write_queue_pending
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn set_last_refresh_at_ns(&self, ns: u64) {
        self.last_refresh_at_ns.store(ns, Ordering::Relaxed);
    }

    pub fn rounds_submitted(&self) -> u64 {
        self.rounds_submitted.load(Ordering::Relaxed)
    }

    pub fn matches_recorded(&self) -> u64 {
        self.matches_recorded.load(Ordering::Relaxed)
    }

    pub fn write_queue_pending(&self) -> u64 {
        self.write_queue_pending.load(Ordering::Relaxed)
    }

    pub fn last_refresh_at_ns(&self) -> u64 {
        self.last_refresh_at_ns.load(Ordering::Relaxed)
    }
}
