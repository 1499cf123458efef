// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mesh indexing, normals, and centroids over packed vertex arrays.
//!
//! Vertices are packed `(x, y, z)` triples in an `f32` slice. Primitives are
//! groups of [`PrimitiveKind::arity`] vertex indices packed in a `u32` slice.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::{Error, Result};
use crate::types::PrimitiveKind;

fn vertex(xyz: &[f32], i: u32) -> Vec3 {
    let i = 3 * i as usize;
    Vec3::new(xyz[i], xyz[i + 1], xyz[i + 2])
}

/// Assign an index to every vertex of every whole primitive in `xyz`.
///
/// With `sequential`, vertex `i` gets index `i`. Otherwise vertices with
/// identical coordinates share the index of the first such vertex, so some
/// indices in `[0, nv)` go unused. Coordinates must match exactly; `-0.0` and
/// `0.0` are treated as equal.
///
/// Trailing vertices that do not complete a primitive are not indexed.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Vertex indices are 32-bit like the renderer's index buffers."
)]
pub fn index_vertices(kind: PrimitiveKind, sequential: bool, xyz: &[f32]) -> Vec<u32> {
    let arity = kind.arity();
    let nv = xyz.len() / 3 / arity * arity;
    if sequential {
        (0..nv as u32).collect()
    } else {
        let mut first_seen: HashMap<[u32; 3], u32> = HashMap::with_capacity(nv);
        (0..nv as u32)
            .map(|jv| {
                let p = vertex(xyz, jv);
                // Adding zero maps -0.0 to 0.0.
                let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
                *first_seen.entry(key).or_insert(jv)
            })
            .collect()
    }
}

/// Check that `indices` describes whole primitives over `nv` vertices.
pub fn validate_indices(kind: PrimitiveKind, indices: &[u32], nv: usize) -> Result<()> {
    if indices.len() % kind.arity() != 0 {
        return Err(Error::LengthMismatch(format!(
            "{} indices do not form whole {kind:?}",
            indices.len()
        )));
    }
    match indices.iter().find(|&&i| i as usize >= nv) {
        Some(&index) => Err(Error::IndexOutOfRange { index, vertices: nv }),
        None => Ok(()),
    }
}

/// The unnormalized normal of each primitive.
///
/// Triangles `(i, j, k)` use `(j - i) × (k - i)`, whose length is twice the
/// triangle's area. Quads `(i, j, k, l)` use the cross product of their
/// diagonals, `(k - i) × (l - j)`, which for planar quads also has length
/// twice the area.
///
/// # Panics
///
/// Panics if an index refers to a vertex beyond the end of `xyz`. Check
/// untrusted indices with [`validate_indices`] first.
pub fn face_normals(kind: PrimitiveKind, indices: &[u32], xyz: &[f32]) -> Vec<Vec3> {
    indices
        .chunks_exact(kind.arity())
        .map(|p| match kind {
            PrimitiveKind::Triangles => {
                let (i, j, k) = (vertex(xyz, p[0]), vertex(xyz, p[1]), vertex(xyz, p[2]));
                (j - i).cross(k - i)
            }
            PrimitiveKind::Quads => {
                let (i, j) = (vertex(xyz, p[0]), vertex(xyz, p[1]));
                let (k, l) = (vertex(xyz, p[2]), vertex(xyz, p[3]));
                (k - i).cross(l - j)
            }
        })
        .collect()
}

/// Area-weighted vertex normals.
///
/// Every primitive adds its [face normal](face_normals) to each vertex it
/// references. The result is packed like `xyz`; vertices that no primitive
/// references keep a zero normal. Normals are not normalized.
///
/// # Panics
///
/// Panics if an index refers to a vertex beyond the end of `xyz`. Check
/// untrusted indices with [`validate_indices`] first.
pub fn compute_normals(kind: PrimitiveKind, indices: &[u32], xyz: &[f32]) -> Vec<f32> {
    let mut uvw = vec![0.0_f32; xyz.len() / 3 * 3];
    let faces = face_normals(kind, indices, xyz);
    for (p, n) in indices.chunks_exact(kind.arity()).zip(faces) {
        for &iv in p {
            let i = 3 * iv as usize;
            uvw[i] += n.x;
            uvw[i + 1] += n.y;
            uvw[i + 2] += n.z;
        }
    }
    uvw
}

/// The centroid of each primitive, packed as `(x, y, z)` triples.
///
/// # Panics
///
/// Panics if an index refers to a vertex beyond the end of `xyz`. Check
/// untrusted indices with [`validate_indices`] first.
pub fn compute_centers(kind: PrimitiveKind, indices: &[u32], xyz: &[f32]) -> Vec<f32> {
    let arity = kind.arity();
    #[allow(clippy::cast_precision_loss, reason = "Arity is 3 or 4.")]
    let weight = 1.0 / arity as f32;
    let mut centers = Vec::with_capacity(indices.len() / arity * 3);
    for p in indices.chunks_exact(arity) {
        let sum = p.iter().fold(Vec3::ZERO, |acc, &iv| acc + vertex(xyz, iv));
        let c = sum * weight;
        centers.extend_from_slice(&[c.x, c.y, c.z]);
    }
    centers
}

/// Samples of a function `z = f(x, y)` on a rectilinear grid.
///
/// `z` is stored with `y` varying fastest: the sample at `(x[ix], y[iy])` is
/// `z[ix * y.len() + iy]`.
#[derive(Copy, Clone, Debug)]
pub struct Grid<'a> {
    x: &'a [f32],
    y: &'a [f32],
    z: &'a [f32],
}

impl<'a> Grid<'a> {
    /// Wrap grid samples, checking that `z` has one value per grid point.
    pub fn new(x: &'a [f32], y: &'a [f32], z: &'a [f32]) -> Result<Self> {
        if z.len() != x.len() * y.len() {
            return Err(Error::LengthMismatch(format!(
                "grid of {} by {} needs {} samples, got {}",
                x.len(),
                y.len(),
                x.len() * y.len(),
                z.len()
            )));
        }
        Ok(Self { x, y, z })
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        let nx = self.x.len().saturating_sub(1);
        let ny = self.y.len().saturating_sub(1);
        (0..nx).flat_map(move |ix| (0..ny).map(move |iy| (ix, iy)))
    }

    fn sample(&self, ix: usize, iy: usize) -> [f32; 3] {
        [self.x[ix], self.y[iy], self.z[ix * self.y.len() + iy]]
    }

    /// Two triangles per grid cell, `(x0,y0) (x0,y1) (x1,y0)` and
    /// `(x1,y0) (x0,y1) (x1,y1)`, as packed vertices.
    pub fn triangles(&self) -> Vec<f32> {
        let mut xyz = Vec::new();
        for (ix, iy) in self.cells() {
            for (jx, jy) in TRIANGLE_CORNERS {
                xyz.extend_from_slice(&self.sample(ix + jx, iy + jy));
            }
        }
        xyz
    }

    /// One quad per grid cell, `(x0,y0) (x0,y1) (x1,y1) (x1,y0)`, as packed
    /// vertices.
    pub fn quads(&self) -> Vec<f32> {
        let mut xyz = Vec::new();
        for (ix, iy) in self.cells() {
            for (jx, jy) in QUAD_CORNERS {
                xyz.extend_from_slice(&self.sample(ix + jx, iy + jy));
            }
        }
        xyz
    }

    /// Per-vertex colors matching [`Grid::triangles`], from one packed
    /// `(r, g, b)` color per grid point.
    pub fn triangle_colors(&self, rgb: &[f32]) -> Result<Vec<f32>> {
        self.corner_colors(rgb, &TRIANGLE_CORNERS)
    }

    /// Per-vertex colors matching [`Grid::quads`], from one packed
    /// `(r, g, b)` color per grid point.
    pub fn quad_colors(&self, rgb: &[f32]) -> Result<Vec<f32>> {
        self.corner_colors(rgb, &QUAD_CORNERS)
    }

    fn corner_colors(&self, rgb: &[f32], corners: &[(usize, usize)]) -> Result<Vec<f32>> {
        if rgb.len() != 3 * self.z.len() {
            return Err(Error::LengthMismatch(format!(
                "{} color components for {} grid points",
                rgb.len(),
                self.z.len()
            )));
        }
        let ny = self.y.len();
        let mut out = Vec::new();
        for (ix, iy) in self.cells() {
            for &(jx, jy) in corners {
                let i = 3 * ((ix + jx) * ny + iy + jy);
                out.extend_from_slice(&rgb[i..i + 3]);
            }
        }
        Ok(out)
    }
}

const TRIANGLE_CORNERS: [(usize, usize); 6] = [(0, 0), (0, 1), (1, 0), (1, 0), (0, 1), (1, 1)];
const QUAD_CORNERS: [(usize, usize); 4] = [(0, 0), (0, 1), (1, 1), (1, 0)];
