//! Snapshot publication cache
//!
//! Decouples "the tree is being modified" from "many readers want this
//! tick's state". The writer publishes one snapshot per tick; readers take
//! reference-counted handles and traverse without holding any lock. The
//! only guarded operation is the pointer swap itself: `publish` stores a
//! new `Arc` under the write side of the lock, `current` clones the `Arc`
//! under the shared side. Readers already holding a handle keep querying
//! the retired snapshot safely; it is freed when the last handle drops.

use std::sync::Arc;

use parking_lot::RwLock;

use super::snapshot::SpatialSnapshot;

/// Publishes and retires [`SpatialSnapshot`] instances
#[derive(Debug)]
pub struct SpatialCache {
    current: RwLock<Arc<SpatialSnapshot>>,
}

impl SpatialCache {
    /// Create a cache serving an empty snapshot until the first publish
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(SpatialSnapshot::empty())),
        }
    }

    /// Atomically replace the current snapshot
    ///
    /// New `current()` calls see the new snapshot immediately; in-flight
    /// readers keep their old handles to completion.
    pub fn publish(&self, snapshot: SpatialSnapshot) {
        let tick = snapshot.tick();
        *self.current.write() = Arc::new(snapshot);
        log::debug!("published spatial snapshot for tick {tick}");
    }

    /// Get a handle to the presently published snapshot
    ///
    /// Safe to call from any number of concurrent readers; the shared lock
    /// is held only long enough to clone the `Arc`.
    pub fn current(&self) -> Arc<SpatialSnapshot> {
        Arc::clone(&self.current.read())
    }
}

impl Default for SpatialCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialConfig;
    use crate::foundation::math::Vec3;
    use crate::spatial::entry::{BehaviorClass, EntityId, LayerMask, SpatialEntry};
    use crate::spatial::SpatialIndex;

    fn index_with_entity(position: Vec3) -> SpatialIndex {
        let mut index = SpatialIndex::new(SpatialConfig::default()).unwrap();
        let entry = SpatialEntry::new(
            EntityId::new(1),
            position,
            1.0,
            LayerMask::DEFAULT,
            BehaviorClass::Dynamic,
        );
        index.insert_or_update(entry).unwrap();
        index
    }

    #[test]
    fn test_cache_starts_empty() {
        let cache = SpatialCache::new();
        let snapshot = cache.current();
        assert_eq!(snapshot.entity_count(), 0);
    }

    #[test]
    fn test_publish_replaces_current() {
        let cache = SpatialCache::new();
        let mut index = index_with_entity(Vec3::zeros());

        cache.publish(index.build_snapshot());
        assert_eq!(cache.current().entity_count(), 1);
        assert_eq!(cache.current().tick(), 1);

        index.remove(EntityId::new(1));
        cache.publish(index.build_snapshot());
        assert_eq!(cache.current().entity_count(), 0);
        assert_eq!(cache.current().tick(), 2);
    }

    #[test]
    fn test_retired_snapshot_stays_valid_for_held_handles() {
        let cache = SpatialCache::new();
        let mut index = index_with_entity(Vec3::zeros());
        cache.publish(index.build_snapshot());

        let held = cache.current();

        // Writer moves the entity and republishes
        let moved = SpatialEntry::new(
            EntityId::new(1),
            Vec3::new(50.0, 50.0, 50.0),
            1.0,
            LayerMask::DEFAULT,
            BehaviorClass::Dynamic,
        );
        index.insert_or_update(moved).unwrap();
        cache.publish(index.build_snapshot());

        // The held handle still answers from the old state
        assert_eq!(
            held.query_radius(Vec3::zeros(), 2.0, LayerMask::all()),
            vec![EntityId::new(1)],
        );
        // A fresh handle sees the move
        let fresh = cache.current();
        assert!(fresh.query_radius(Vec3::zeros(), 2.0, LayerMask::all()).is_empty());
        assert_eq!(
            fresh.query_radius(Vec3::new(50.0, 50.0, 50.0), 2.0, LayerMask::all()),
            vec![EntityId::new(1)],
        );
    }
}
