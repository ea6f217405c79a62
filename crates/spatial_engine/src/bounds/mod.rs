//! Bounding-volume geometry
//!
//! Pure, stateless intersection math used by the octree: axis-aligned
//! bounding boxes, planes, and view frustums. Everything here operates on
//! values and never touches index state.

mod aabb;
mod frustum;

pub use aabb::AABB;
pub use frustum::{Frustum, Plane};
