//! View frustum and plane tests for visibility queries

use crate::foundation::math::{Mat4, Vec3};

use super::AABB;

/// Plane defined by normal and distance from origin
///
/// Points with a non-negative signed distance are on the "inside" half of
/// the plane; frustum planes all face inward.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Normal vector (should be normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    ///
    /// The normal need not be unit length: both it and `distance` are
    /// rescaled together, so the plane stays where the caller specified.
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.magnitude();
        Self {
            normal: normal / length,
            distance: distance / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six inward-facing planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Uses the Gribb-Hartmann method: each plane is a sum or difference of
    /// the matrix's fourth row with one of the other rows. Assumes the
    /// OpenGL-style clip volume (`-w <= x,y,z <= w`).
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| {
            [
                vp_matrix[(i, 0)],
                vp_matrix[(i, 1)],
                vp_matrix[(i, 2)],
                vp_matrix[(i, 3)],
            ]
        };
        let w = row(3);

        let combine = |other: [f32; 4], sign: f32| {
            let a = w[0] + sign * other[0];
            let b = w[1] + sign * other[1];
            let c = w[2] + sign * other[2];
            let d = w[3] + sign * other[3];

            let normal = Vec3::new(a, b, c);
            let length = normal.magnitude();
            if length > f32::EPSILON {
                Plane {
                    normal: normal / length,
                    distance: d / length,
                }
            } else {
                // Degenerate row combination; a zero plane rejects nothing
                Plane {
                    normal: Vec3::zeros(),
                    distance: 0.0,
                }
            }
        };

        Self {
            planes: [
                combine(row(0), 1.0),  // left
                combine(row(0), -1.0), // right
                combine(row(1), 1.0),  // bottom
                combine(row(1), -1.0), // top
                combine(row(2), 1.0),  // near
                combine(row(2), -1.0), // far
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        // For each plane, test the AABB corner furthest along the plane
        // normal (the p-vertex); if that corner is outside, the whole box is
        for plane in &self.planes {
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(center) >= -radius)
    }
}
