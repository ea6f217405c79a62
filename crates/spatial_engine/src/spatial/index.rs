//! Live spatial index: the single-writer side of the engine
//!
//! [`SpatialIndex`] owns the octree arena and an entity-to-node map so that
//! moves and removals route straight to the owning node instead of
//! searching the tree. All write operations happen from one logical writer
//! per tick; readers go through [`super::SpatialSnapshot`] handles
//! published after the write batch.

use std::collections::HashMap;

use crate::bounds::{Frustum, AABB};
use crate::config::{ConfigError, SpatialConfig};
use crate::foundation::math::{self, Vec3};

use super::entry::{BehaviorClass, EntityId, LayerMask, SpatialEntry};
use super::octree::{child_bounds, collect_frustum, collect_radius, octant_index, OctreeNode};
use super::snapshot::SpatialSnapshot;
use super::SpatialError;

/// Arena index of the root node
const ROOT: usize = 0;

/// Octree-backed spatial index over a fixed world volume
///
/// Placement is always derived from an entry's position against node
/// bounds; the membership map is a cache for O(1) routing only.
#[derive(Debug)]
pub struct SpatialIndex {
    /// Flat arena of octree nodes; children occupy consecutive blocks of 8
    nodes: Vec<OctreeNode>,
    /// Entity id to arena index of the node currently holding it
    locations: HashMap<EntityId, usize>,
    config: SpatialConfig,
    /// Largest bounding radius ever tracked; widens query pruning so
    /// entries reaching outside their leaf are never missed
    max_entry_radius: f32,
    /// Monotonic counter stamped onto snapshots at build time
    tick: u64,
}

impl SpatialIndex {
    /// Create a new index over the configured world bounds
    ///
    /// Fails immediately on an invalid configuration; per-entity problems
    /// later on are recovered locally and never abort a tick.
    pub fn new(config: SpatialConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let root = OctreeNode::new(config.world_bounds(), 0);
        log::info!(
            "spatial index created: bounds {:?}, capacity {}, max depth {}",
            config.world_bounds(),
            config.max_entries_per_node,
            config.max_depth,
        );
        Ok(Self {
            nodes: vec![root],
            locations: HashMap::new(),
            config,
            max_entry_radius: 0.0,
            tick: 0,
        })
    }

    /// World bounding volume covered by this index
    pub fn world_bounds(&self) -> AABB {
        self.nodes[ROOT].bounds
    }

    /// Number of entities currently tracked
    pub fn entity_count(&self) -> usize {
        self.locations.len()
    }

    /// Look up the current spatial facts for an entity
    pub fn entry(&self, id: EntityId) -> Option<SpatialEntry> {
        let node = *self.locations.get(&id)?;
        self.nodes[node].entries.iter().find(|e| e.id == id).copied()
    }

    /// Insert a new entry or update an existing one
    ///
    /// Positions outside the world bounds are clamped to the boundary and
    /// logged rather than rejected; losing track of an entity spatially is
    /// worse than pinning it to the edge. Non-finite input is the only
    /// hard error.
    pub fn insert_or_update(&mut self, entry: SpatialEntry) -> Result<(), SpatialError> {
        let mut entry = entry;
        Self::validate_entry(&entry)?;
        self.clamp_to_world(&mut entry);

        // Monotonic like the tree itself: removals do not shrink it, which
        // only ever makes pruning more conservative, never incorrect
        if entry.radius > self.max_entry_radius {
            self.max_entry_radius = entry.radius;
        }

        match self.locations.get(&entry.id).copied() {
            Some(node) => self.update_existing(node, entry),
            None => self.insert_from_root(entry),
        }
        Ok(())
    }

    /// Remove an entity from the index
    ///
    /// Removing an unknown or already-removed id is a no-op: destruction
    /// ordering between spatial bookkeeping and the entity store is not
    /// guaranteed.
    pub fn remove(&mut self, id: EntityId) {
        if let Some(node) = self.locations.remove(&id) {
            self.nodes[node].remove_entry(id);
        }
    }

    /// Drop all entities, keeping the configured world bounds
    pub fn clear(&mut self) {
        let bounds = self.nodes[ROOT].bounds;
        self.nodes.clear();
        self.nodes.push(OctreeNode::new(bounds, 0));
        self.locations.clear();
        self.max_entry_radius = 0.0;
    }

    /// Build an immutable snapshot of the current state
    ///
    /// Called once per tick after the write batch; the returned snapshot
    /// never changes and is safe to hand to any number of readers.
    pub fn build_snapshot(&mut self) -> SpatialSnapshot {
        self.tick += 1;
        SpatialSnapshot::from_arena(
            self.nodes.clone(),
            self.max_entry_radius,
            self.tick,
            self.locations.len(),
        )
    }

    /// Raw radius query against the live tree
    ///
    /// For single-threaded callers inside the write phase; concurrent
    /// readers should query a published snapshot instead.
    pub fn query_radius(&self, origin: Vec3, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        let mut results = Vec::new();
        collect_radius(
            &self.nodes,
            ROOT,
            origin,
            radius,
            self.max_entry_radius,
            mask,
            &mut results,
        );
        results
    }

    /// Raw frustum query against the live tree
    pub fn query_frustum(&self, frustum: &Frustum, mask: LayerMask) -> Vec<EntityId> {
        let mut results = Vec::new();
        collect_frustum(
            &self.nodes,
            ROOT,
            frustum,
            self.max_entry_radius,
            mask,
            &mut results,
        );
        results
    }

    /// Bounds of every leaf node, for debug overlays
    pub fn leaf_bounds(&self) -> Vec<AABB> {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.bounds)
            .collect()
    }

    fn validate_entry(entry: &SpatialEntry) -> Result<(), SpatialError> {
        if !math::is_finite(entry.position) {
            return Err(SpatialError::NonFinitePosition {
                id: entry.id,
                position: [entry.position.x, entry.position.y, entry.position.z],
            });
        }
        if !entry.radius.is_finite() || entry.radius < 0.0 {
            return Err(SpatialError::InvalidRadius {
                id: entry.id,
                radius: entry.radius,
            });
        }
        Ok(())
    }

    fn clamp_to_world(&self, entry: &mut SpatialEntry) {
        let world = self.nodes[ROOT].bounds;
        if !world.contains_point(entry.position) {
            let clamped = world.clamp_point(entry.position);
            log::warn!(
                "entity {} at ({}, {}, {}) is outside world bounds, clamping to boundary",
                entry.id.raw(),
                entry.position.x,
                entry.position.y,
                entry.position.z,
            );
            entry.position = clamped;
        }
    }

    /// Update an entry already tracked by the index
    ///
    /// Unmoved entries (all Static entries in practice) and moves within
    /// the owning node mutate in place; moves out of the node pay the
    /// remove-and-reinsert path, which is O(tree depth).
    fn update_existing(&mut self, node: usize, entry: SpatialEntry) {
        let Some(old_position) = self.nodes[node]
            .entries
            .iter()
            .find(|e| e.id == entry.id)
            .map(|e| e.position)
        else {
            // Membership map out of sync with the node list; recover by
            // treating this as a fresh insertion
            self.locations.remove(&entry.id);
            self.insert_from_root(entry);
            return;
        };

        let moved = old_position != entry.position;
        if moved && entry.behavior == BehaviorClass::Static {
            log::warn!(
                "static entity {} changed position; re-inserting",
                entry.id.raw(),
            );
        }

        if !moved || self.nodes[node].bounds.contains_point(entry.position) {
            if let Some(slot) = self.nodes[node].entry_mut(entry.id) {
                *slot = entry;
            }
            return;
        }

        self.nodes[node].remove_entry(entry.id);
        self.locations.remove(&entry.id);
        self.insert_from_root(entry);
    }

    /// Route an entry from the root to its leaf, subdividing as needed
    ///
    /// The position is already clamped into the root bounds, so descent
    /// always terminates at a leaf within `max_depth` steps.
    fn insert_from_root(&mut self, entry: SpatialEntry) {
        let mut current = ROOT;
        loop {
            if let Some(first) = self.nodes[current].first_child {
                let octant = octant_index(self.nodes[current].bounds.center(), entry.position);
                current = first + octant;
                continue;
            }

            let node = &self.nodes[current];
            let at_capacity = node.entries.len() >= self.config.max_entries_per_node;
            let can_split = node.depth < self.config.max_depth
                && node.bounds.extents().x > self.config.min_node_size;

            if at_capacity && can_split {
                self.subdivide(current);
                continue;
            }

            if at_capacity {
                // Overflow at max depth is tolerated; the leaf just scans longer
                log::trace!(
                    "leaf at depth {} over capacity ({} entries)",
                    node.depth,
                    node.entries.len() + 1,
                );
            }
            self.nodes[current].entries.push(entry);
            self.locations.insert(entry.id, current);
            return;
        }
    }

    /// Convert a leaf into an internal node and redistribute its entries
    fn subdivide(&mut self, index: usize) {
        let first = self.nodes.len();
        let bounds = self.nodes[index].bounds;
        let depth = self.nodes[index].depth;

        for octant in 0..8 {
            self.nodes.push(OctreeNode::new(child_bounds(&bounds, octant), depth + 1));
        }

        let redistributed = std::mem::take(&mut self.nodes[index].entries);
        self.nodes[index].first_child = Some(first);

        let center = bounds.center();
        for entry in redistributed {
            let child = first + octant_index(center, entry.position);
            self.nodes[child].entries.push(entry);
            self.locations.insert(entry.id, child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Plane;

    fn test_config() -> SpatialConfig {
        SpatialConfig {
            world_center: [0.0, 0.0, 0.0],
            world_extent: 100.0,
            max_entries_per_node: 8,
            max_depth: 4,
            min_node_size: 1.0,
        }
    }

    fn dynamic_entry(id: u64, position: Vec3) -> SpatialEntry {
        SpatialEntry::new(
            EntityId::new(id),
            position,
            1.0,
            LayerMask::DEFAULT,
            BehaviorClass::Dynamic,
        )
    }

    /// Membership map must always point at the node actually holding the entry
    fn assert_membership_consistent(index: &SpatialIndex) {
        for (id, node) in &index.locations {
            assert!(
                index.nodes[*node].entries.iter().any(|e| e.id == *id),
                "membership map points entity {} at node {} which does not hold it",
                id.raw(),
                node,
            );
        }
    }

    #[test]
    fn test_basic_insert_and_query() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        index.insert_or_update(dynamic_entry(1, Vec3::zeros())).unwrap();

        assert_eq!(index.entity_count(), 1);
        let results = index.query_radius(Vec3::zeros(), 2.0, LayerMask::all());
        assert_eq!(results, vec![EntityId::new(1)]);
    }

    #[test]
    fn test_subdivision_keeps_all_entries_findable() {
        let mut index = SpatialIndex::new(test_config()).unwrap();

        // Nine spread-out entries against a capacity of eight
        let positions: Vec<Vec3> = (0..9)
            .map(|i| {
                let offset = (i as f32) * 10.0 - 40.0;
                Vec3::new(offset, offset * 0.5, -offset)
            })
            .collect();
        for (i, position) in positions.iter().enumerate() {
            index.insert_or_update(dynamic_entry(i as u64, *position)).unwrap();
        }

        assert!(!index.nodes[ROOT].is_leaf(), "root should have subdivided");
        assert_eq!(index.leaf_bounds().len(), 8);
        assert_eq!(index.entity_count(), 9);
        assert_membership_consistent(&index);

        for (i, position) in positions.iter().enumerate() {
            let found = index.query_radius(*position, 0.1, LayerMask::all());
            assert!(
                found.contains(&EntityId::new(i as u64)),
                "entity {i} lost after subdivision",
            );
        }
    }

    #[test]
    fn test_out_of_bounds_position_is_clamped() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        index
            .insert_or_update(dynamic_entry(7, Vec3::new(500.0, 0.0, 0.0)))
            .unwrap();

        let stored = index.entry(EntityId::new(7)).unwrap();
        assert_eq!(stored.position, Vec3::new(100.0, 0.0, 0.0));
        let found = index.query_radius(Vec3::new(100.0, 0.0, 0.0), 0.5, LayerMask::all());
        assert_eq!(found, vec![EntityId::new(7)]);
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let mut index = SpatialIndex::new(test_config()).unwrap();

        let bad_position = dynamic_entry(1, Vec3::new(f32::NAN, 0.0, 0.0));
        assert!(matches!(
            index.insert_or_update(bad_position),
            Err(SpatialError::NonFinitePosition { .. })
        ));

        let mut bad_radius = dynamic_entry(2, Vec3::zeros());
        bad_radius.radius = -1.0;
        assert!(matches!(
            index.insert_or_update(bad_radius),
            Err(SpatialError::InvalidRadius { .. })
        ));

        assert_eq!(index.entity_count(), 0);
    }

    #[test]
    fn test_move_between_nodes() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        index.insert_or_update(dynamic_entry(1, Vec3::zeros())).unwrap();

        index
            .insert_or_update(dynamic_entry(1, Vec3::new(50.0, 50.0, 50.0)))
            .unwrap();

        assert_eq!(index.entity_count(), 1);
        assert!(index.query_radius(Vec3::zeros(), 2.0, LayerMask::all()).is_empty());
        assert_eq!(
            index.query_radius(Vec3::new(50.0, 50.0, 50.0), 2.0, LayerMask::all()),
            vec![EntityId::new(1)],
        );
        assert_membership_consistent(&index);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        index.insert_or_update(dynamic_entry(1, Vec3::zeros())).unwrap();
        index.insert_or_update(dynamic_entry(2, Vec3::new(10.0, 0.0, 0.0))).unwrap();

        index.remove(EntityId::new(1));
        index.remove(EntityId::new(1));
        index.remove(EntityId::new(99)); // never inserted

        assert_eq!(index.entity_count(), 1);
        assert_eq!(
            index.query_radius(Vec3::new(10.0, 0.0, 0.0), 1.0, LayerMask::all()),
            vec![EntityId::new(2)],
        );
    }

    #[test]
    fn test_capacity_overflow_at_max_depth() {
        let config = SpatialConfig {
            max_depth: 1,
            max_entries_per_node: 2,
            ..test_config()
        };
        let mut index = SpatialIndex::new(config).unwrap();

        // All at the same position: subdivision cannot separate them, so the
        // max-depth leaf must absorb the overflow
        for i in 0..6 {
            index.insert_or_update(dynamic_entry(i, Vec3::new(5.0, 5.0, 5.0))).unwrap();
        }

        assert_eq!(index.entity_count(), 6);
        let found = index.query_radius(Vec3::new(5.0, 5.0, 5.0), 0.5, LayerMask::all());
        assert_eq!(found.len(), 6);
    }

    #[test]
    fn test_layer_filtering() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        let mut creature = dynamic_entry(1, Vec3::zeros());
        creature.layers = LayerMask::CREATURE;
        let mut terrain = dynamic_entry(2, Vec3::new(1.0, 0.0, 0.0));
        terrain.layers = LayerMask::TERRAIN;
        index.insert_or_update(creature).unwrap();
        index.insert_or_update(terrain).unwrap();

        let creatures = index.query_radius(Vec3::zeros(), 5.0, LayerMask::CREATURE);
        assert_eq!(creatures, vec![EntityId::new(1)]);

        let everything = index.query_radius(Vec3::zeros(), 5.0, LayerMask::all());
        assert_eq!(everything.len(), 2);
    }

    /// Force a tree where entity 1 (radius 10) sits in the leaf covering
    /// [0, 25]^3 of a [0, 100]^3 world, so its bounding sphere reaches
    /// well outside its own leaf.
    fn index_with_wide_entry() -> SpatialIndex {
        let config = SpatialConfig {
            world_center: [50.0, 50.0, 50.0],
            world_extent: 50.0,
            max_entries_per_node: 1,
            max_depth: 3,
            min_node_size: 1.0,
        };
        let mut index = SpatialIndex::new(config).unwrap();

        let mut wide = dynamic_entry(1, Vec3::new(1.0, 10.0, 10.0));
        wide.radius = 10.0;
        index.insert_or_update(wide).unwrap();
        // Two point entities to force subdivision down to the 25^3 leaf
        let mut far = dynamic_entry(2, Vec3::new(80.0, 80.0, 80.0));
        far.radius = 0.0;
        index.insert_or_update(far).unwrap();
        let mut near = dynamic_entry(3, Vec3::new(40.0, 40.0, 40.0));
        near.radius = 0.0;
        index.insert_or_update(near).unwrap();

        let leaves = index.leaf_bounds();
        assert!(
            leaves.iter().any(|b| b.extents().x <= 12.5 && b.contains_point(Vec3::new(1.0, 10.0, 10.0))),
            "expected the wide entry to end up in a 25^3 leaf",
        );
        index
    }

    #[test]
    fn test_radius_query_reaches_entry_extending_past_its_leaf() {
        let index = index_with_wide_entry();

        // Query sphere misses the [0, 25]^3 leaf (closest face is 5 away)
        // but the entry's own radius covers the 6-unit gap to its center
        let found = index.query_radius(Vec3::new(-5.0, 10.0, 10.0), 2.0, LayerMask::all());
        assert_eq!(found, vec![EntityId::new(1)]);

        // Past the combined reach the entry must still be excluded
        let too_far = index.query_radius(Vec3::new(-20.0, 10.0, 10.0), 2.0, LayerMask::all());
        assert!(too_far.is_empty());
    }

    #[test]
    fn test_frustum_query_reaches_entry_extending_past_its_leaf() {
        let index = index_with_wide_entry();

        // Frustum covering x in [-30, -1]: outside every leaf, but the wide
        // entry's bounding sphere crosses into it
        let frustum = Frustum::new([
            Plane::new(Vec3::new(1.0, 0.0, 0.0), 30.0),
            Plane::new(Vec3::new(-1.0, 0.0, 0.0), -1.0),
            Plane::new(Vec3::new(0.0, 1.0, 0.0), 0.0),
            Plane::new(Vec3::new(0.0, -1.0, 0.0), 100.0),
            Plane::new(Vec3::new(0.0, 0.0, 1.0), 0.0),
            Plane::new(Vec3::new(0.0, 0.0, -1.0), 100.0),
        ]);

        let visible = index.query_frustum(&frustum, LayerMask::all());
        assert_eq!(visible, vec![EntityId::new(1)]);
    }

    #[test]
    fn test_in_place_update_preserves_node() {
        let mut index = SpatialIndex::new(test_config()).unwrap();
        index.insert_or_update(dynamic_entry(1, Vec3::zeros())).unwrap();
        let before = *index.locations.get(&EntityId::new(1)).unwrap();

        // Small move that stays within the root leaf
        index.insert_or_update(dynamic_entry(1, Vec3::new(0.5, 0.0, 0.0))).unwrap();
        let after = *index.locations.get(&EntityId::new(1)).unwrap();

        assert_eq!(before, after);
        assert_eq!(
            index.entry(EntityId::new(1)).unwrap().position,
            Vec3::new(0.5, 0.0, 0.0),
        );
    }
}
