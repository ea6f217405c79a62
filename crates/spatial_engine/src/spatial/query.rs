//! Public query API for downstream systems
//!
//! The query engine is the only read entry point: it resolves every query
//! against the currently published snapshot and never touches the live
//! index. Results are facts at call time; an entity that moves after a
//! query returns is not retroactively reflected, callers re-query next
//! tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::bounds::Frustum;
use crate::foundation::math::{self, Vec3};

use super::cache::SpatialCache;
use super::entry::{EntityId, LayerMask};

/// Per-tick query counters for performance monitoring
///
/// Counters are relaxed atomics: readers on any thread may bump them, and
/// the simulation resets them once per tick when it publishes.
#[derive(Debug, Default)]
pub struct QueryStats {
    queries: AtomicU64,
    results: AtomicU64,
    rejected: AtomicU64,
}

impl QueryStats {
    fn record(&self, result_count: usize) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.results.fetch_add(result_count as u64, Ordering::Relaxed);
    }

    fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the current counter values
    pub fn snapshot(&self) -> QueryStatsSnapshot {
        QueryStatsSnapshot {
            queries: self.queries.load(Ordering::Relaxed),
            results: self.results.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero (called once per tick)
    pub fn reset(&self) {
        self.queries.store(0, Ordering::Relaxed);
        self.results.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of the query counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryStatsSnapshot {
    /// Queries answered since the last reset (batch origins count individually)
    pub queries: u64,
    /// Total entity handles returned since the last reset
    pub results: u64,
    /// Degenerate queries rejected before traversal
    pub rejected: u64,
}

/// Snapshot-backed query API: radius, batched radius, and frustum queries
#[derive(Debug)]
pub struct QueryEngine {
    cache: Arc<SpatialCache>,
    stats: QueryStats,
}

impl QueryEngine {
    /// Create a query engine reading from the given cache
    pub fn new(cache: Arc<SpatialCache>) -> Self {
        Self {
            cache,
            stats: QueryStats::default(),
        }
    }

    /// Query all entities within `radius` of `origin`, filtered by layer mask
    ///
    /// A degenerate query (negative or non-finite radius, non-finite
    /// origin) yields an empty result rather than propagating bad values
    /// into the traversal.
    pub fn query_radius(&self, origin: Vec3, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        if !Self::is_valid_sphere(origin, radius) {
            log::debug!("rejecting degenerate radius query at {origin:?} r={radius}");
            self.stats.record_rejected();
            return Vec::new();
        }

        let snapshot = self.cache.current();
        let results = snapshot.query_radius(origin, radius, mask);
        self.stats.record(results.len());
        results
    }

    /// Answer many radius queries against one snapshot acquisition
    ///
    /// Produces `(origin_index, entity)` pairs; per origin the matches are
    /// identical to an individual [`Self::query_radius`] call against the
    /// same snapshot. One handle services the whole batch, so N origins
    /// cost one synchronization event instead of N.
    pub fn query_radius_batch(
        &self,
        origins: &[Vec3],
        radii: &[f32],
        mask: LayerMask,
    ) -> Vec<(usize, EntityId)> {
        if origins.len() != radii.len() {
            log::debug!(
                "rejecting batch query with mismatched lengths ({} origins, {} radii)",
                origins.len(),
                radii.len(),
            );
            self.stats.record_rejected();
            return Vec::new();
        }

        let snapshot = self.cache.current();
        let mut results = Vec::new();
        let mut scratch = Vec::new();

        for (index, (&origin, &radius)) in origins.iter().zip(radii).enumerate() {
            if !Self::is_valid_sphere(origin, radius) {
                self.stats.record_rejected();
                continue;
            }
            scratch.clear();
            snapshot.query_radius_into(origin, radius, mask, &mut scratch);
            self.stats.record(scratch.len());
            results.extend(scratch.iter().map(|&id| (index, id)));
        }

        results
    }

    /// Query all entities visible in the frustum, filtered by layer mask
    pub fn query_frustum(&self, frustum: &Frustum, mask: LayerMask) -> Vec<EntityId> {
        let snapshot = self.cache.current();
        let results = snapshot.query_frustum(frustum, mask);
        self.stats.record(results.len());
        results
    }

    /// Read the per-tick query counters
    pub fn stats(&self) -> QueryStatsSnapshot {
        self.stats.snapshot()
    }

    /// Reset the per-tick query counters
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    fn is_valid_sphere(origin: Vec3, radius: f32) -> bool {
        math::is_finite(origin) && radius.is_finite() && radius >= 0.0
    }
}
