// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line segments and their intersections with spheres and triangles.

use glam::{DMat4, DVec3};

use crate::types::BoundingSphere;

/// Tolerance below which a segment is treated as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A line segment between two endpoints `a` and `b`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    a: DVec3,
    b: DVec3,
}

impl Segment {
    /// Create a segment with endpoints `a` and `b`.
    pub const fn new(a: DVec3, b: DVec3) -> Self {
        Self { a, b }
    }

    /// First endpoint.
    pub const fn a(&self) -> DVec3 {
        self.a
    }

    /// Second endpoint.
    pub const fn b(&self) -> DVec3 {
        self.b
    }

    /// Vector from `a` to `b`.
    pub fn direction(&self) -> DVec3 {
        self.b - self.a
    }

    /// Length of the segment.
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Point at parameter `t`, where `t = 0` is `a` and `t = 1` is `b`.
    pub fn point_at(&self, t: f64) -> DVec3 {
        self.a + t * self.direction()
    }

    /// This segment with both endpoints mapped through a (possibly
    /// projective) transform.
    pub fn transformed(&self, m: &DMat4) -> Self {
        Self {
            a: m.project_point3(self.a),
            b: m.project_point3(self.b),
        }
    }

    /// The point on the segment closest to `p`.
    pub fn closest_point(&self, p: DVec3) -> DVec3 {
        let ab = self.direction();
        let ap_ab = (p - self.a).dot(ab);
        if ap_ab <= 0.0 {
            return self.a;
        }
        let ab_ab = ab.length_squared();
        if ab_ab <= ap_ab {
            return self.b;
        }
        self.a + ab * (ap_ab / ab_ab)
    }

    /// Whether any point of the segment lies inside or on the sphere.
    ///
    /// Empty spheres never intersect; infinite spheres always do.
    pub fn intersects_sphere(&self, bs: &BoundingSphere) -> bool {
        match *bs {
            BoundingSphere::Empty => false,
            BoundingSphere::Infinite => true,
            BoundingSphere::Finite { center, radius } => {
                self.closest_point(center).distance_squared(center) <= radius * radius
            }
        }
    }

    /// Intersection of this segment with the triangle `(p0, p1, p2)`.
    ///
    /// Both faces of the triangle are hit. Returns `None` when the segment
    /// misses the triangle, stops short of it, or lies parallel to its plane.
    pub fn intersect_triangle(&self, p0: DVec3, p1: DVec3, p2: DVec3) -> Option<DVec3> {
        let d = self.direction();
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let h = d.cross(e2);
        let det = e1.dot(h);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = self.a - p0;
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = inv_det * d.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = inv_det * e2.dot(q);
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(self.point_at(t))
    }
}
