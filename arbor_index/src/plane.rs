// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Oriented planes in 3D.

use glam::{DMat4, DVec3, DVec4};

use crate::types::BoundingSphere;

/// Where a bounding sphere lies relative to a plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// Wholly on the negative side.
    Below,
    /// Crossing or touching the plane.
    Straddles,
    /// Wholly on the positive side.
    Above,
}

/// A plane `a*x + b*y + c*z + d = 0` with a unit normal `(a, b, c)`.
///
/// Points with a positive signed distance are *above* the plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    coefficients: DVec4,
}

impl Plane {
    /// Create a plane from its coefficients, normalizing so that the normal
    /// has unit length. A zero normal is kept as-is.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self::from_coefficients(DVec4::new(a, b, c, d))
    }

    /// The plane through `point` with the given normal.
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        Self::from_coefficients(normal.extend(-normal.dot(point)))
    }

    fn from_coefficients(p: DVec4) -> Self {
        let len = p.truncate().length();
        let coefficients = if len > 0.0 { p / len } else { p };
        Self { coefficients }
    }

    /// Unit normal `(a, b, c)`.
    pub fn normal(&self) -> DVec3 {
        self.coefficients.truncate()
    }

    /// Offset `d`.
    pub fn offset(&self) -> f64 {
        self.coefficients.w
    }

    /// Signed distance from the plane to a point.
    pub fn distance_to(&self, p: DVec3) -> f64 {
        self.normal().dot(p) + self.offset()
    }

    /// Classify a sphere against this plane.
    ///
    /// Empty spheres are reported as below and infinite spheres as straddling.
    pub fn classify(&self, bs: &BoundingSphere) -> Side {
        match *bs {
            BoundingSphere::Empty => Side::Below,
            BoundingSphere::Infinite => Side::Straddles,
            BoundingSphere::Finite { center, radius } => {
                let s = self.distance_to(center);
                if s < -radius {
                    Side::Below
                } else if s > radius {
                    Side::Above
                } else {
                    Side::Straddles
                }
            }
        }
    }

    /// The image of this plane under the transform whose *inverse* is `m`.
    ///
    /// Planes transform with the inverse transpose, so passing the inverse
    /// here avoids inverting. For example, with `m = world_to_cube`, a plane
    /// expressed in cube coordinates is returned in world coordinates.
    pub fn transformed_with_inverse(&self, m: &DMat4) -> Self {
        Self::from_coefficients(m.transpose() * self.coefficients)
    }
}
