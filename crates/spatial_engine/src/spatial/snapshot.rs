//! Immutable point-in-time view of the spatial index
//!
//! A snapshot is a frozen copy of the octree arena. It is built once per
//! tick by the writer, published through [`super::SpatialCache`], and read
//! through `Arc` handles by any number of threads without coordination.
//! Queries against a snapshot see exactly the state at publication time,
//! regardless of writes happening to the live index.

use crate::bounds::Frustum;
use crate::foundation::math::Vec3;

use super::entry::{EntityId, LayerMask};
use super::octree::{collect_frustum, collect_radius, OctreeNode};

/// Arena index of the root node
const ROOT: usize = 0;

/// Read-only copy of the spatial index at one publication point
#[derive(Debug, Clone)]
pub struct SpatialSnapshot {
    nodes: Vec<OctreeNode>,
    /// Largest bounding radius in the captured tree, for query pruning
    max_entry_radius: f32,
    tick: u64,
    entity_count: usize,
}

impl SpatialSnapshot {
    /// Snapshot of an empty index; what a cache serves before the first publish
    pub fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            max_entry_radius: 0.0,
            tick: 0,
            entity_count: 0,
        }
    }

    pub(crate) fn from_arena(
        nodes: Vec<OctreeNode>,
        max_entry_radius: f32,
        tick: u64,
        entity_count: usize,
    ) -> Self {
        Self { nodes, max_entry_radius, tick, entity_count }
    }

    /// Tick counter at which this snapshot was built
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of entities captured in this snapshot
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Query all entities within `radius` of `origin`, filtered by layer mask
    pub fn query_radius(&self, origin: Vec3, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        let mut results = Vec::new();
        self.query_radius_into(origin, radius, mask, &mut results);
        results
    }

    /// Radius query appending into a caller-provided buffer
    ///
    /// Lets batched callers reuse one allocation across many origins.
    pub fn query_radius_into(
        &self,
        origin: Vec3,
        radius: f32,
        mask: LayerMask,
        results: &mut Vec<EntityId>,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        collect_radius(
            &self.nodes,
            ROOT,
            origin,
            radius,
            self.max_entry_radius,
            mask,
            results,
        );
    }

    /// Query all entities visible in the frustum, filtered by layer mask
    pub fn query_frustum(&self, frustum: &Frustum, mask: LayerMask) -> Vec<EntityId> {
        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            collect_frustum(
                &self.nodes,
                ROOT,
                frustum,
                self.max_entry_radius,
                mask,
                &mut results,
            );
        }
        results
    }
}
