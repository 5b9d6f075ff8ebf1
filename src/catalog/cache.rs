//! Per-wallet track cache with a time-to-live.
//!
//! Entries are fresh while `now - fetched_at < ttl`. Stale entries are never
//! served; [`TrackCache::sweep`] drops them so the map doesn't grow with
//! every wallet ever viewed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::discovery::MusicTrack;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A wallet's tracks and when they were fetched
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub tracks: Vec<MusicTrack>,
    pub fetched_at: DateTime<Utc>,
}

/// Wallet address → tracks
pub struct TrackCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TrackCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    /// Cache on the system clock
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Tracks for `wallet` if cached and still fresh
    pub fn get_fresh(&self, wallet: &str) -> Option<Vec<MusicTrack>> {
        let now = self.clock.now();
        self.entries
            .read()
            .get(wallet)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| entry.tracks.clone())
    }

    /// Store tracks for `wallet`, stamped with the current time
    pub fn insert(&self, wallet: &str, tracks: Vec<MusicTrack>) {
        let entry = CacheEntry {
            tracks,
            fetched_at: self.clock.now(),
        };
        self.entries.write().insert(wallet.to_string(), entry);
    }

    /// Drop the entry for `wallet`; true if there was one
    pub fn invalidate(&self, wallet: &str) -> bool {
        self.entries.write().remove(wallet).is_some()
    }

    /// Drop every stale entry, returning how many were removed
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    /// Drop everything
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sweep every `interval` until `shutdown` is cancelled
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(target: "catalog::cache", removed, "Swept stale entries");
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
        })
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        // A fetch stamped in the future (clock moved back) counts as age zero
        let age = now
            .signed_duration_since(entry.fetched_at)
            .to_std()
            .unwrap_or_default();
        age < self.ttl
    }
}

/// Test clock moved by hand
#[cfg(test)]
pub struct ManualClock {
    now: parking_lot::Mutex<DateTime<Utc>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: parking_lot::Mutex::new(Utc::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap();
        *self.now.lock() += delta;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
