//! # Spatial Engine
//!
//! Octree-based spatial partitioning and query engine for real-time
//! simulations with hundreds to thousands of dynamic entities.
//!
//! ## Architecture
//!
//! Each simulation tick has a single-writer update phase followed by a
//! concurrent read phase:
//!
//! ```text
//! Entity store (writer)          AI / render culling (readers)
//!        ↓                                  ↓
//!  SpatialIndex ── build_snapshot ──→ SpatialCache ──→ QueryEngine
//! ```
//!
//! The writer applies moves, creations, and destructions to the
//! [`spatial::SpatialIndex`], then publishes an immutable
//! [`spatial::SpatialSnapshot`] through the [`spatial::SpatialCache`].
//! Readers query the published snapshot through the
//! [`spatial::QueryEngine`] without acquiring any per-query lock; the only
//! synchronized operation is the pointer swap at publish time.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use spatial_engine::prelude::*;
//!
//! let config = SpatialConfig { world_extent: 50.0, max_depth: 4, ..Default::default() };
//! let mut index = SpatialIndex::new(config)?;
//! let cache = Arc::new(SpatialCache::new());
//! let engine = QueryEngine::new(Arc::clone(&cache));
//!
//! // Write phase
//! index.insert_or_update(SpatialEntry::new(
//!     EntityId::new(1),
//!     Vec3::zeros(),
//!     1.0,
//!     LayerMask::DEFAULT,
//!     BehaviorClass::Dynamic,
//! ))?;
//! cache.publish(index.build_snapshot());
//!
//! // Read phase
//! let nearby = engine.query_radius(Vec3::zeros(), 2.0, LayerMask::DEFAULT);
//! assert_eq!(nearby.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod bounds;
pub mod config;
pub mod foundation;
pub mod spatial;

pub use config::{ConfigError, SpatialConfig};
pub use spatial::SpatialError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        bounds::{Frustum, Plane, AABB},
        config::{ConfigError, SpatialConfig},
        foundation::math::{Mat4, Vec3},
        spatial::{
            BehaviorClass, EntityId, LayerMask, QueryEngine, QueryStatsSnapshot, SpatialCache,
            SpatialEntry, SpatialError, SpatialIndex, SpatialSnapshot,
        },
    };
}
