//! Cache lifecycle: hit counting, active listing and the expiry sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use phyto_core::entities::DiagnosisCacheEntry;
use phyto_db::error::DatabaseError;
use phyto_db::repos::CacheStats;
use phyto_db::service::PhytoService;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// The only writer of cache bookkeeping after an entry is created.
#[derive(Clone)]
pub struct CacheLifecycle {
    store: Arc<PhytoService>,
}

impl CacheLifecycle {
    pub const fn new(store: Arc<PhytoService>) -> Self {
        Self { store }
    }

    /// Atomically bump an entry's hit counter.
    ///
    /// Returns `false` if the entry is gone, e.g. swept between being
    /// matched and being counted.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the update cannot be executed.
    pub async fn increment_hit_count(&self, cache_id: &str) -> Result<bool, DatabaseError> {
        let updated = self.store.increment_cache_hit_count(cache_id).await?;
        if !updated {
            tracing::debug!(cache_id, "cache entry vanished before its hit was counted");
        }
        Ok(updated)
    }

    /// Entries that have not expired yet.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the cache cannot be read.
    pub async fn active_entries(&self) -> Result<Vec<DiagnosisCacheEntry>, DatabaseError> {
        self.store.get_active_cache_entries().await
    }

    /// Delete expired entries, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the delete fails.
    pub async fn cleanup_expired(&self) -> Result<u64, DatabaseError> {
        let removed = self.store.cleanup_expired_cache().await?;
        tracing::info!(removed, "expired cache entries swept");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the cache cannot be read.
    pub async fn stats(&self) -> Result<CacheStats, DatabaseError> {
        self.store.cache_stats().await
    }
}

/// Result of one sweep attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "removed", rename_all = "snake_case")]
pub enum SweepOutcome {
    Swept(u64),
    /// Another sweep was already running.
    Skipped,
}

/// Recurring expiry sweep with a single-flight guard.
pub struct CacheSweeper {
    lifecycle: CacheLifecycle,
    interval: Duration,
    running: AtomicBool,
}

/// Held while a sweep runs; clears the flag on drop.
pub struct SweepGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl CacheSweeper {
    /// `interval` is clamped to at least one second.
    pub fn new(lifecycle: CacheLifecycle, interval: Duration) -> Self {
        Self {
            lifecycle,
            interval: interval.max(Duration::from_secs(1)),
            running: AtomicBool::new(false),
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Claim the sweep slot, or `None` if a sweep is in progress.
    pub fn try_begin(&self) -> Option<SweepGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SweepGuard {
                running: &self.running,
            })
    }

    /// Run one sweep unless another is already running.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the delete fails.
    pub async fn sweep_once(&self) -> Result<SweepOutcome, DatabaseError> {
        let Some(_guard) = self.try_begin() else {
            tracing::debug!("cache sweep already running, skipping");
            return Ok(SweepOutcome::Skipped);
        };
        Ok(SweepOutcome::Swept(self.lifecycle.cleanup_expired().await?))
    }

    /// Sweep every `interval` until `cancel` fires. The first sweep runs
    /// immediately. Failed sweeps are logged and retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(interval_secs = self.interval.as_secs(), "cache sweeper started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::warn!(%e, "cache sweep failed");
                    }
                }
            }
        }
        tracing::info!("cache sweeper stopped");
    }
}
