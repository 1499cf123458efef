// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding volume types: axis-aligned boxes and spheres in 3D.
//!
//! Both types can be *empty* (they bound nothing) or *infinite* (they bound
//! everything). Expanding an empty volume by some content yields a volume that
//! bounds exactly that content; expanding anything by an infinite volume yields
//! an infinite volume.

use glam::{DMat4, DVec3};

/// One of the three coordinate axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All axes in tie-break order.
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Component index of this axis (`0`, `1` or `2`).
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Axis-aligned bounding box in 3D.
///
/// A box is empty when any of its minimum coordinates exceeds the
/// corresponding maximum coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    min: DVec3,
    max: DVec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// A box that bounds nothing.
    pub const fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::INFINITY),
            max: DVec3::splat(f64::NEG_INFINITY),
        }
    }

    /// A box that bounds everything.
    pub const fn infinite() -> Self {
        Self {
            min: DVec3::splat(f64::NEG_INFINITY),
            max: DVec3::splat(f64::INFINITY),
        }
    }

    /// Create a box from its minimum and maximum corners.
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// The smallest box containing every point in a packed `(x,y,z)` array.
    ///
    /// Trailing coordinates that do not form a whole point are ignored.
    pub fn from_packed(xyz: &[f32]) -> Self {
        let mut bb = Self::empty();
        for p in xyz.chunks_exact(3) {
            bb.expand_by_point(DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])));
        }
        bb
    }

    /// The smallest box containing the points `(x[i], y[i], z[i])`.
    ///
    /// Only the common prefix of the three slices is considered.
    pub fn from_axes(x: &[f32], y: &[f32], z: &[f32]) -> Self {
        let mut bb = Self::empty();
        for ((&x, &y), &z) in x.iter().zip(y).zip(z) {
            bb.expand_by_point(DVec3::new(f64::from(x), f64::from(y), f64::from(z)));
        }
        bb
    }

    /// Minimum corner.
    pub const fn min(&self) -> DVec3 {
        self.min
    }

    /// Maximum corner.
    pub const fn max(&self) -> DVec3 {
        self.max
    }

    /// Returns true if this box bounds nothing.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Returns true if this box bounds everything.
    pub fn is_infinite(&self) -> bool {
        self.min == DVec3::splat(f64::NEG_INFINITY) && self.max == DVec3::splat(f64::INFINITY)
    }

    /// Center of the box. Meaningless for empty or infinite boxes.
    pub fn center(&self) -> DVec3 {
        0.5 * (self.min + self.max)
    }

    /// Per-axis extent (`max - min`). Zero for empty boxes.
    pub fn extent(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// The axis with the greatest extent.
    ///
    /// Ties are resolved in the order x, y, z: the first axis whose extent
    /// equals the maximum wins.
    pub fn longest_axis(&self) -> Axis {
        let e = self.extent();
        let m = e.max_element();
        if e.x == m {
            Axis::X
        } else if e.y == m {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Copy of this box with the maximum along `axis` replaced by `value`.
    pub fn with_max(&self, axis: Axis, value: f64) -> Self {
        let mut max = self.max;
        max[axis.index()] = value;
        Self { min: self.min, max }
    }

    /// Copy of this box with the minimum along `axis` replaced by `value`.
    pub fn with_min(&self, axis: Axis, value: f64) -> Self {
        let mut min = self.min;
        min[axis.index()] = value;
        Self { min, max: self.max }
    }

    /// Grow this box to contain a point.
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow this box to contain another box.
    pub fn expand_by_box(&mut self, other: &Self) {
        if !other.is_empty() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// Whether this box contains the point (boundary inclusive).
    pub fn contains_point(&self, p: DVec3) -> bool {
        !self.is_empty() && self.min.cmple(p).all() && p.cmple(self.max).all()
    }

    /// Whether this box and `other` overlap (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.cmple(other.max).all()
            && other.min.cmple(self.max).all()
    }

    /// The eight corners of a non-empty box; bit `i` of the corner index
    /// selects the maximum along axis `i`.
    pub fn corners(&self) -> [DVec3; 8] {
        core::array::from_fn(|i| {
            DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }
}

/// Bounding sphere in 3D.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum BoundingSphere {
    /// Bounds nothing.
    #[default]
    Empty,
    /// A sphere with a finite, non-negative radius.
    Finite {
        /// Center of the sphere.
        center: DVec3,
        /// Radius of the sphere; never negative.
        radius: f64,
    },
    /// Bounds everything.
    Infinite,
}

impl BoundingSphere {
    /// A finite sphere. A negative radius is clamped to zero.
    pub fn new(center: DVec3, radius: f64) -> Self {
        debug_assert!(radius >= 0.0, "bounding sphere radius must be non-negative");
        Self::Finite {
            center,
            radius: radius.max(0.0),
        }
    }

    /// A zero-radius sphere at the origin.
    pub const fn origin() -> Self {
        Self::Finite {
            center: DVec3::ZERO,
            radius: 0.0,
        }
    }

    /// The sphere circumscribing a box; empty and infinite boxes map to empty
    /// and infinite spheres.
    pub fn from_box(bb: &BoundingBox) -> Self {
        let mut bs = Self::Empty;
        bs.expand_by_box(bb);
        bs
    }

    /// Returns true if this sphere bounds nothing.
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns true if this sphere bounds everything.
    pub const fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Center, if finite.
    pub const fn center(&self) -> Option<DVec3> {
        match self {
            Self::Finite { center, .. } => Some(*center),
            _ => None,
        }
    }

    /// Radius, if not empty. Infinite spheres report `f64::INFINITY`.
    pub const fn radius(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Finite { radius, .. } => Some(*radius),
            Self::Infinite => Some(f64::INFINITY),
        }
    }

    /// Whether this sphere contains the point (boundary inclusive).
    pub fn contains(&self, p: DVec3) -> bool {
        match self {
            Self::Empty => false,
            Self::Finite { center, radius } => center.distance_squared(p) <= radius * radius,
            Self::Infinite => true,
        }
    }

    /// Grow this sphere to contain a point, moving the center toward it.
    ///
    /// The new sphere is the smallest one containing both the old sphere and
    /// the point.
    pub fn expand_by_point(&mut self, p: DVec3) {
        match self {
            Self::Infinite => {}
            Self::Empty => *self = Self::new(p, 0.0),
            Self::Finite { center, radius } => {
                let dp = p - *center;
                let d = dp.length();
                if d > *radius {
                    let dr = 0.5 * (d - *radius);
                    *center += dp * (dr / d);
                    *radius += dr;
                }
            }
        }
    }

    /// Grow this sphere to contain a point without moving the center.
    pub fn expand_radius_by_point(&mut self, p: DVec3) {
        match self {
            Self::Infinite => {}
            Self::Empty => *self = Self::new(p, 0.0),
            Self::Finite { center, radius } => {
                let d = center.distance(p);
                if d > *radius {
                    *radius = d;
                }
            }
        }
    }

    /// Grow this sphere to the smallest sphere containing both it and `other`.
    pub fn expand_by_sphere(&mut self, other: &Self) {
        match (*self, *other) {
            (Self::Infinite, _) | (_, Self::Empty) => {}
            (_, Self::Infinite) => *self = Self::Infinite,
            (Self::Empty, o) => *self = o,
            (
                Self::Finite { center, radius },
                Self::Finite {
                    center: oc,
                    radius: or,
                },
            ) => {
                let dc = oc - center;
                let d = dc.length();
                if d == 0.0 {
                    if or > radius {
                        *self = Self::new(center, or);
                    }
                } else if d + or > radius {
                    if or >= d + radius {
                        *self = *other;
                        return;
                    }
                    // Far points of both spheres along the line of centers.
                    let a = center - dc * (radius / d);
                    let b = oc + dc * (or / d);
                    *self = Self::new(0.5 * (a + b), 0.5 * a.distance(b));
                }
            }
        }
    }

    /// Grow this sphere to contain `other` without moving the center.
    pub fn expand_radius_by_sphere(&mut self, other: &Self) {
        match (*self, *other) {
            (Self::Infinite, _) | (_, Self::Empty) => {}
            (_, Self::Infinite) => *self = Self::Infinite,
            (Self::Empty, o) => *self = o,
            (
                Self::Finite { center, radius },
                Self::Finite {
                    center: oc,
                    radius: or,
                },
            ) => {
                let r = center.distance(oc) + or;
                if r > radius {
                    *self = Self::new(center, r);
                }
            }
        }
    }

    /// Grow this sphere to contain a box.
    ///
    /// The result circumscribes a box that contains both the given box and
    /// the extreme points of the current sphere in the directions of the box
    /// corners.
    pub fn expand_by_box(&mut self, bb: &BoundingBox) {
        if self.is_infinite() || bb.is_empty() {
            return;
        }
        if bb.is_infinite() {
            *self = Self::Infinite;
            return;
        }
        let mut grown = *bb;
        if let Self::Finite { center, radius } = *self {
            for corner in bb.corners() {
                let dc = corner - center;
                let d = dc.length();
                let s = if d > 0.0 { radius / d } else { radius };
                grown.expand_by_point(center - dc * s);
            }
        }
        *self = Self::new(grown.center(), 0.5 * (grown.max() - grown.min()).length());
    }

    /// Grow this sphere to contain a box without moving the center.
    pub fn expand_radius_by_box(&mut self, bb: &BoundingBox) {
        if self.is_infinite() || bb.is_empty() {
            return;
        }
        if bb.is_infinite() {
            *self = Self::Infinite;
            return;
        }
        if self.is_empty() {
            *self = Self::new(bb.center(), 0.5 * (bb.max() - bb.min()).length());
        } else {
            for corner in bb.corners() {
                self.expand_radius_by_point(corner);
            }
        }
    }

    /// A sphere bounding the image of this sphere under an affine transform.
    ///
    /// The center is mapped directly; the radius is the longest image of the
    /// three axis-aligned radius vectors, which is exact for similarity
    /// transforms and conservative enough for mild anisotropic scales.
    pub fn transformed(&self, m: &DMat4) -> Self {
        match *self {
            Self::Finite { center, radius } => {
                let c = m.transform_point3(center);
                let r = [DVec3::X, DVec3::Y, DVec3::Z]
                    .into_iter()
                    .map(|axis| m.transform_point3(center + axis * radius).distance(c))
                    .fold(0.0_f64, f64::max);
                Self::new(c, r)
            }
            other => other,
        }
    }
}
