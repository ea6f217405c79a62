//! Octree node storage and traversal
//!
//! Nodes live in a flat arena (`Vec<OctreeNode>`) and reference their
//! children by index: subdividing a leaf appends its eight children as one
//! consecutive block. The flat layout is what lets [`super::SpatialIndex`]
//! keep an O(1) entity-to-node map, and it makes snapshotting the whole
//! tree a single `Vec` clone.

use crate::bounds::{Frustum, AABB};
use crate::foundation::math::Vec3;

use super::entry::{EntityId, LayerMask, SpatialEntry};

/// Single node in the octree hierarchy
///
/// A node is either a leaf holding entries or an internal node whose eight
/// children occupy `first_child .. first_child + 8` in the arena. Internal
/// nodes hold no entries of their own.
#[derive(Debug, Clone)]
pub(crate) struct OctreeNode {
    /// World-space bounds of this node
    pub bounds: AABB,
    /// Depth in the tree (0 = root)
    pub depth: u32,
    /// Entries contained in this node (leaves only)
    pub entries: Vec<SpatialEntry>,
    /// Arena index of the first of 8 consecutive children; None for leaves
    pub first_child: Option<usize>,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bounds: AABB, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            entries: Vec::new(),
            first_child: None,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.first_child.is_none()
    }

    /// Remove the entry with the given id from this node's local list
    pub fn remove_entry(&mut self, id: EntityId) -> Option<SpatialEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.swap_remove(index))
    }

    /// Get a mutable reference to this node's entry with the given id
    pub fn entry_mut(&mut self, id: EntityId) -> Option<&mut SpatialEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

/// Get the octant index (0-7) for a position relative to a node center
///
/// Positions exactly on a midpoint plane go to the positive-side child, so
/// every position maps to exactly one octant.
pub(crate) fn octant_index(center: Vec3, position: Vec3) -> usize {
    // Octant layout:
    // bit 0: +X half, bit 1: +Y half, bit 2: +Z half
    let x_bit = usize::from(position.x >= center.x);
    let y_bit = usize::from(position.y >= center.y);
    let z_bit = usize::from(position.z >= center.z);
    (z_bit << 2) | (y_bit << 1) | x_bit
}

/// Compute the bounds of one octant of a parent AABB
pub(crate) fn child_bounds(parent: &AABB, octant: usize) -> AABB {
    let center = parent.center();
    let quarter = parent.extents() * 0.5;

    let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
    let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
    let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

    let child_center = Vec3::new(
        center.x + quarter.x * x_sign,
        center.y + quarter.y * y_sign,
        center.z + quarter.z * z_sign,
    );

    AABB::from_center_extents(child_center, quarter)
}

/// Collect all entries within `radius` of `origin`, filtered by layer mask
///
/// Entries are stored by center position but can reach outside their leaf
/// by their bounding radius, so the prune test widens the query sphere by
/// `max_entry_radius` (the largest bounding radius in the tree). Leaf
/// entries then match exactly: origin-to-center distance within
/// `radius + entry.radius` and intersecting layer masks.
pub(crate) fn collect_radius(
    nodes: &[OctreeNode],
    node: usize,
    origin: Vec3,
    radius: f32,
    max_entry_radius: f32,
    mask: LayerMask,
    results: &mut Vec<EntityId>,
) {
    let current = &nodes[node];

    if !current.bounds.intersects_sphere(origin, radius + max_entry_radius) {
        return;
    }

    for entry in &current.entries {
        if !entry.layers.intersects(mask) {
            continue;
        }
        let combined = radius + entry.radius;
        if (entry.position - origin).magnitude_squared() <= combined * combined {
            results.push(entry.id);
        }
    }

    if let Some(first) = current.first_child {
        for octant in 0..8 {
            collect_radius(nodes, first + octant, origin, radius, max_entry_radius, mask, results);
        }
    }
}

/// Collect all entries whose bounding sphere intersects the frustum
///
/// Node bounds are expanded by `max_entry_radius` before the prune test so
/// entries extending past their leaf into the frustum are still reached.
pub(crate) fn collect_frustum(
    nodes: &[OctreeNode],
    node: usize,
    frustum: &Frustum,
    max_entry_radius: f32,
    mask: LayerMask,
    results: &mut Vec<EntityId>,
) {
    let current = &nodes[node];

    let expanded = if max_entry_radius > 0.0 {
        let expansion = Vec3::new(max_entry_radius, max_entry_radius, max_entry_radius);
        AABB::new(current.bounds.min - expansion, current.bounds.max + expansion)
    } else {
        current.bounds
    };
    if !frustum.intersects_aabb(&expanded) {
        return;
    }

    for entry in &current.entries {
        if !entry.layers.intersects(mask) {
            continue;
        }
        if frustum.intersects_sphere(entry.position, entry.radius) {
            results.push(entry.id);
        }
    }

    if let Some(first) = current.first_child {
        for octant in 0..8 {
            collect_frustum(nodes, first + octant, frustum, max_entry_radius, mask, results);
        }
    }
}
