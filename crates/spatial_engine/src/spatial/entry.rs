//! Spatial entry types: entity handles, layer masks, behavior classes

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Opaque entity identifier supplied by the entity store
///
/// Identifiers are unique and never reused while the entity is live; the
/// spatial engine treats them as plain handles and never allocates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity id from a raw handle value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

bitflags! {
    /// Layer mask selecting which query categories an entity may match
    ///
    /// Queries carry a mask as well; an entity matches when the two masks
    /// share at least one bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        /// Default category for untagged entities
        const DEFAULT = 1 << 0;
        /// Static world geometry and terrain
        const TERRAIN = 1 << 1;
        /// Creatures and other AI-driven agents
        const CREATURE = 1 << 2;
        /// Short-lived projectiles
        const PROJECTILE = 1 << 3;
        /// Trigger volumes with no physical presence
        const TRIGGER = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
    }
}

/// How often an entity's position is expected to change
///
/// A hint only: it selects the cheapest correct update path, never the
/// placement itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BehaviorClass {
    /// Never expected to move after initial placement
    Static,
    /// Expected to move most ticks
    Dynamic,
    /// Moves rarely
    Occasional,
}

/// One tracked entity's spatial facts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    /// Entity handle
    pub id: EntityId,
    /// World position of the entity's center
    pub position: Vec3,
    /// Bounding radius; 0 means a point entity
    pub radius: f32,
    /// Categories this entity may match in queries
    pub layers: LayerMask,
    /// Re-insertion frequency hint
    pub behavior: BehaviorClass,
}

impl SpatialEntry {
    /// Create a new spatial entry
    pub fn new(
        id: EntityId,
        position: Vec3,
        radius: f32,
        layers: LayerMask,
        behavior: BehaviorClass,
    ) -> Self {
        Self { id, position, radius, layers, behavior }
    }
}
