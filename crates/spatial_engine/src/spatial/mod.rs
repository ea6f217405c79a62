//! Spatial partitioning and query engine
//!
//! The write side ([`SpatialIndex`]) applies one tick's entity changes,
//! then builds a [`SpatialSnapshot`] and hands it to the [`SpatialCache`].
//! All reads for the tick go through the [`QueryEngine`] against the
//! published snapshot, so readers never see a half-updated tree and never
//! wait on the writer.

mod cache;
mod entry;
mod index;
mod octree;
mod query;
mod snapshot;

pub use cache::SpatialCache;
pub use entry::{BehaviorClass, EntityId, LayerMask, SpatialEntry};
pub use index::SpatialIndex;
pub use query::{QueryEngine, QueryStats, QueryStatsSnapshot};
pub use snapshot::SpatialSnapshot;

use thiserror::Error;

/// Errors raised by write operations on the spatial index
///
/// These cover malformed input only. Out-of-bounds positions are clamped
/// rather than rejected, unknown ids on removal are no-ops, and capacity
/// overflow at maximum depth is tolerated by design.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Position contains NaN or infinite components
    #[error("entity {id:?} has non-finite position {position:?}")]
    NonFinitePosition {
        /// Entity the bad update targeted
        id: EntityId,
        /// The offending position components
        position: [f32; 3],
    },

    /// Bounding radius is negative or non-finite
    #[error("entity {id:?} has invalid bounding radius {radius}")]
    InvalidRadius {
        /// Entity the bad update targeted
        id: EntityId,
        /// The offending radius
        radius: f32,
    },
}
