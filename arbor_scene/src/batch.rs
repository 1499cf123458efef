// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leaf batches and the mesh builder that partitions meshes into them.

use arbor_index::{BoundingBox, BoundingBoxTree, BoundingSphere, Segment, TreeNodeId};
use glam::DVec3;

use crate::error::{Error, Result};
use crate::mesh;
use crate::scene::Scene;
use crate::state::StateSet;
use crate::types::{NodeFlags, NodeId, PrimitiveKind};

/// Default number of primitives below which a mesh node is not split further.
pub const DEFAULT_MIN_PER_LEAF: usize = 1024;

/// A renderer-ready run of un-indexed primitives.
///
/// Vertices (and normals and colors, when present) are packed `f32` triples,
/// [`PrimitiveKind::arity`] per primitive. The bounding sphere is fixed at
/// construction.
#[derive(Clone, Debug)]
pub struct LeafBatch {
    kind: PrimitiveKind,
    count: usize,
    vertices: Vec<f32>,
    normals: Option<Vec<f32>>,
    colors: Option<Vec<f32>>,
    bounds: BoundingSphere,
}

impl LeafBatch {
    /// Create a batch from un-indexed packed arrays.
    ///
    /// The bounding sphere circumscribes the vertices' bounding box.
    pub fn new(
        kind: PrimitiveKind,
        vertices: Vec<f32>,
        normals: Option<Vec<f32>>,
        colors: Option<Vec<f32>>,
    ) -> Result<Self> {
        let per_primitive = 3 * kind.arity();
        if vertices.len() % per_primitive != 0 {
            return Err(Error::LengthMismatch(format!(
                "{} vertex coordinates do not form whole {kind:?}",
                vertices.len()
            )));
        }
        for (name, array) in [("normal", &normals), ("color", &colors)] {
            if let Some(a) = array
                && a.len() != vertices.len()
            {
                return Err(Error::LengthMismatch(format!(
                    "{} {name} components for {} vertex coordinates",
                    a.len(),
                    vertices.len()
                )));
            }
        }
        let bounds = BoundingSphere::from_box(&BoundingBox::from_packed(&vertices));
        Ok(Self {
            kind,
            count: vertices.len() / per_primitive,
            vertices,
            normals,
            colors,
            bounds,
        })
    }

    /// Gather the primitives of one tree leaf into a batch.
    ///
    /// `primitives` lists primitive numbers into `indices`. The sphere covers
    /// both the tree node's box and the gathered vertices.
    fn gather(
        kind: PrimitiveKind,
        node_box: &BoundingBox,
        primitives: &[usize],
        data: &MeshData<'_>,
    ) -> Self {
        let arity = kind.arity();
        let n = 3 * arity * primitives.len();
        let mut vertices = Vec::with_capacity(n);
        let mut normals = data.normals.map(|_| Vec::with_capacity(n));
        let mut colors = data.colors.map(|_| Vec::with_capacity(n));
        for &ip in primitives {
            for &iv in &data.indices[arity * ip..arity * (ip + 1)] {
                let i = 3 * iv as usize;
                vertices.extend_from_slice(&data.xyz[i..i + 3]);
                if let (Some(out), Some(uvw)) = (normals.as_mut(), data.normals) {
                    out.extend_from_slice(&uvw[i..i + 3]);
                }
                if let (Some(out), Some(rgb)) = (colors.as_mut(), data.colors) {
                    out.extend_from_slice(&rgb[i..i + 3]);
                }
            }
        }
        let mut bbox = *node_box;
        bbox.expand_by_box(&BoundingBox::from_packed(&vertices));
        Self {
            kind,
            count: primitives.len(),
            vertices,
            normals,
            colors,
            bounds: BoundingSphere::from_box(&bbox),
        }
    }

    /// Primitive kind.
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Number of primitives.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Packed vertex coordinates.
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Packed vertex normals, if any.
    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    /// Packed vertex colors, if any.
    pub fn colors(&self) -> Option<&[f32]> {
        self.colors.as_deref()
    }

    /// The precomputed bounding sphere.
    pub const fn bounding_sphere(&self) -> &BoundingSphere {
        &self.bounds
    }

    /// Vertices of primitive `p` in `f64`.
    fn corners(&self, p: usize) -> impl Iterator<Item = DVec3> + '_ {
        let arity = self.kind.arity();
        self.vertices[3 * arity * p..3 * arity * (p + 1)]
            .chunks_exact(3)
            .map(|v| DVec3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
    }

    /// Every point where `segment` crosses a primitive of this batch.
    ///
    /// Quads `(i, j, k, l)` are tested as triangle `(i, j, k)` and, only if
    /// that misses, as `(k, l, i)`; each primitive contributes at most one
    /// point.
    pub fn intersect_segment(&self, segment: &Segment) -> Vec<DVec3> {
        let mut hits = Vec::new();
        for p in 0..self.count {
            let c: Vec<DVec3> = self.corners(p).collect();
            match self.kind {
                PrimitiveKind::Triangles => {
                    hits.extend(segment.intersect_triangle(c[0], c[1], c[2]));
                }
                PrimitiveKind::Quads => {
                    hits.extend(
                        segment
                            .intersect_triangle(c[0], c[1], c[2])
                            .or_else(|| segment.intersect_triangle(c[2], c[3], c[0])),
                    );
                }
            }
        }
        hits
    }
}

struct MeshData<'a> {
    xyz: &'a [f32],
    indices: &'a [u32],
    normals: Option<&'a [f32]>,
    colors: Option<&'a [f32]>,
}

/// Builds a mesh group: a selectable group whose subtree partitions a
/// triangle or quad mesh into [`LeafBatch`]es.
///
/// Primitive centroids are split with a [`BoundingBoxTree`]; each tree leaf
/// becomes a batch and each internal tree node an intermediate group.
///
/// ```
/// use arbor_scene::{MeshBuilder, Scene};
///
/// let mut scene = Scene::new();
/// let xyz = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let mesh = MeshBuilder::triangles(&xyz).insert(&mut scene).unwrap();
/// assert_eq!(scene.mesh_stats(mesh).unwrap().primitives, 1);
/// assert!(scene.is_selectable(mesh));
/// ```
#[derive(Clone, Debug)]
pub struct MeshBuilder<'a> {
    kind: PrimitiveKind,
    xyz: &'a [f32],
    indices: Option<&'a [u32]>,
    normals: Option<&'a [f32]>,
    colors: Option<&'a [f32]>,
    vertex_normals: bool,
    min_per_leaf: usize,
    states: StateSet,
}

impl<'a> MeshBuilder<'a> {
    /// A builder for a mesh of `kind` over packed vertex coordinates.
    pub fn new(kind: PrimitiveKind, xyz: &'a [f32]) -> Self {
        Self {
            kind,
            xyz,
            indices: None,
            normals: None,
            colors: None,
            vertex_normals: true,
            min_per_leaf: DEFAULT_MIN_PER_LEAF,
            states: StateSet::mesh_default(),
        }
    }

    /// A builder for triangles.
    pub fn triangles(xyz: &'a [f32]) -> Self {
        Self::new(PrimitiveKind::Triangles, xyz)
    }

    /// A builder for quads.
    pub fn quads(xyz: &'a [f32]) -> Self {
        Self::new(PrimitiveKind::Quads, xyz)
    }

    /// Use explicit vertex indices instead of indexing the vertices.
    pub fn indices(mut self, indices: &'a [u32]) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Use explicit per-vertex normals instead of computing them.
    pub fn normals(mut self, uvw: &'a [f32]) -> Self {
        self.normals = Some(uvw);
        self
    }

    /// Attach per-vertex colors.
    pub fn colors(mut self, rgb: &'a [f32]) -> Self {
        self.colors = Some(rgb);
        self
    }

    /// Without explicit indices, whether vertices with equal coordinates are
    /// shared so that normals are smoothed across primitives (`true`, the
    /// default) or every primitive keeps its own flat normal.
    pub fn vertex_normals(mut self, enabled: bool) -> Self {
        self.vertex_normals = enabled;
        self
    }

    /// Split tree nodes while half their primitive count is at least `n`.
    pub fn min_per_leaf(mut self, n: usize) -> Self {
        self.min_per_leaf = n;
        self
    }

    /// Render states for the mesh group, replacing the defaults.
    pub fn states(mut self, states: StateSet) -> Self {
        self.states = states;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.xyz.len() % 3 != 0 {
            return Err(Error::LengthMismatch(format!(
                "{} vertex coordinates are not whole points",
                self.xyz.len()
            )));
        }
        for (name, array) in [("normal", self.normals), ("color", self.colors)] {
            if let Some(a) = array
                && a.len() != self.xyz.len()
            {
                return Err(Error::LengthMismatch(format!(
                    "{} {name} components for {} vertex coordinates",
                    a.len(),
                    self.xyz.len()
                )));
            }
        }
        let nv = self.xyz.len() / 3;
        match self.indices {
            Some(indices) => mesh::validate_indices(self.kind, indices, nv),
            None if nv % self.kind.arity() != 0 => Err(Error::LengthMismatch(format!(
                "{nv} vertices do not form whole {:?}",
                self.kind
            ))),
            None => Ok(()),
        }
    }

    /// Build the mesh group into `scene` and return its (parentless) root.
    pub fn insert(self, scene: &mut Scene) -> Result<NodeId> {
        self.validate()?;
        let kind = self.kind;
        let indexed;
        let indices = match self.indices {
            Some(indices) => indices,
            None => {
                let sequential = !self.vertex_normals || self.normals.is_some();
                indexed = mesh::index_vertices(kind, sequential, self.xyz);
                indexed.as_slice()
            }
        };
        let computed;
        let normals = match self.normals {
            Some(uvw) => uvw,
            None => {
                computed = mesh::compute_normals(kind, indices, self.xyz);
                computed.as_slice()
            }
        };
        let data = MeshData {
            xyz: self.xyz,
            indices,
            normals: Some(normals),
            colors: self.colors,
        };

        let centers = mesh::compute_centers(kind, indices, self.xyz);
        let tree = BoundingBoxTree::new(self.min_per_leaf, &centers)?;
        if tree.size() == 0 {
            tracing::warn!(?kind, "building a mesh group with no primitives");
        }

        let root = scene.insert_group();
        scene.set_flags(root, NodeFlags::default() | NodeFlags::SELECTABLE)?;
        scene.set_states(root, self.states)?;
        attach(scene, root, &tree, tree.root(), kind, &data)?;

        let stats = scene.mesh_stats(root)?;
        tracing::debug!(
            ?kind,
            primitives = stats.primitives,
            batches = stats.batches,
            depth = tree.depth(),
            "built mesh group"
        );
        Ok(root)
    }
}

fn attach(
    scene: &mut Scene,
    parent: NodeId,
    tree: &BoundingBoxTree,
    id: TreeNodeId,
    kind: PrimitiveKind,
    data: &MeshData<'_>,
) -> Result<()> {
    let node = tree.node(id);
    match (node.left(), node.right()) {
        (Some(left), Some(right)) => {
            let group = scene.insert_group();
            scene.add_child(parent, group)?;
            attach(scene, group, tree, left, kind, data)?;
            attach(scene, group, tree, right, kind, data)
        }
        _ => {
            let batch = LeafBatch::gather(kind, node.bounding_box(), tree.node_indices(id), data);
            let leaf = scene.insert_batch(batch);
            scene.add_child(parent, leaf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeKind;
    use crate::state::StateSet;
    use crate::types::Rgb;
    use arbor_index::Segment;

    fn strip(n: usize) -> Vec<f32> {
        // `n` unit triangles along x.
        (0..n)
            .flat_map(|i| {
                let x = i as f32;
                [x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0]
            })
            .collect()
    }

    fn batches(scene: &Scene, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if scene.batch(id).is_some() {
                out.push(id);
            }
            stack.extend(scene.children(id).iter().rev());
        }
        out
    }

    #[test]
    fn small_mesh_is_one_batch_with_defaults() {
        let mut scene = Scene::new();
        let xyz = strip(10);
        let root = MeshBuilder::triangles(&xyz).insert(&mut scene).unwrap();
        assert!(scene.is_selectable(root));
        assert_eq!(scene.states(root), Some(&StateSet::mesh_default()));
        assert_eq!(scene.states(root).and_then(|s| s.color), Some(Rgb::LIGHT_GRAY));

        let leaves = batches(&scene, root);
        assert_eq!(leaves.len(), 1);
        let batch = scene.batch(leaves[0]).unwrap();
        assert_eq!(batch.count(), 10);
        assert_eq!(batch.vertices().len(), 90);
        assert_eq!(batch.normals().map(<[f32]>::len), Some(90));
        assert!(batch.colors().is_none());
    }

    #[test]
    fn large_mesh_splits_into_a_binary_tree() {
        let mut scene = Scene::new();
        let xyz = strip(40);
        let root = MeshBuilder::triangles(&xyz)
            .min_per_leaf(8)
            .insert(&mut scene)
            .unwrap();
        // 40 -> 20 -> 10 -> (5, 5): four leaves of 10 each, not split again.
        let leaves = batches(&scene, root);
        assert_eq!(leaves.len(), 4);
        assert_eq!(scene.mesh_stats(root).unwrap().primitives, 40);
        for &leaf in &leaves {
            assert_eq!(scene.batch(leaf).unwrap().count(), 10);
        }

        // Internal nodes are plain groups with exactly two children.
        let inner = scene.children(root)[0];
        assert!(matches!(scene.kind(inner), Some(NodeKind::Group)));
        assert_eq!(scene.count_children(inner), 2);
    }

    #[test]
    fn leaf_spheres_contain_their_vertices() {
        let mut scene = Scene::new();
        let xyz = strip(64);
        let root = MeshBuilder::triangles(&xyz)
            .min_per_leaf(4)
            .insert(&mut scene)
            .unwrap();
        let mut seen = 0;
        for leaf in batches(&scene, root) {
            let batch = scene.batch(leaf).unwrap();
            let bs = batch.bounding_sphere();
            let c = bs.center().unwrap();
            let r = bs.radius().unwrap();
            for v in batch.vertices().chunks_exact(3) {
                let p = DVec3::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2]));
                assert!(p.distance(c) <= r + 1e-9);
            }
            seen += batch.count();
        }
        assert_eq!(seen, 64);
        let root_bs = scene.bounding_sphere(root, false).unwrap();
        assert!(root_bs.contains(DVec3::new(63.5, 0.25, 0.0)));
    }

    #[test]
    fn flat_and_smooth_normals() {
        // Two triangles sharing an edge, folded along it.
        let xyz = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0,
        ];
        let normal_of_first_shared = |vertex_normals: bool| {
            let mut scene = Scene::new();
            let root = MeshBuilder::triangles(&xyz)
                .vertex_normals(vertex_normals)
                .insert(&mut scene)
                .unwrap();
            let leaf = batches(&scene, root)[0];
            let n = scene.batch(leaf).unwrap().normals().unwrap();
            [n[3], n[4], n[5]]
        };
        assert_eq!(normal_of_first_shared(false), [0.0, 0.0, 1.0]);
        let smooth = normal_of_first_shared(true);
        assert_ne!(smooth, [0.0, 0.0, 1.0], "shared vertex blends both faces");
    }

    #[test]
    fn explicit_indices_normals_and_colors() {
        let xyz = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
        let uvw = [0.0, 0.0, 1.0].repeat(4);
        let rgb = [1.0, 0.0, 0.0].repeat(4);
        let ijk = [0, 1, 2, 0, 2, 3];
        let mut scene = Scene::new();
        let root = MeshBuilder::triangles(&xyz)
            .indices(&ijk)
            .normals(&uvw)
            .colors(&rgb)
            .insert(&mut scene)
            .unwrap();
        let leaf = batches(&scene, root)[0];
        let batch = scene.batch(leaf).unwrap();
        assert_eq!(batch.count(), 2);
        assert_eq!(batch.colors().unwrap().len(), 18);
        assert_eq!(&batch.normals().unwrap()[..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn rejects_malformed_input() {
        let mut scene = Scene::new();
        let xyz = strip(2);
        assert!(matches!(
            MeshBuilder::triangles(&xyz[..17]).insert(&mut scene),
            Err(Error::LengthMismatch(_))
        ));
        assert!(matches!(
            MeshBuilder::quads(&xyz).insert(&mut scene),
            Err(Error::LengthMismatch(_))
        ));
        assert!(matches!(
            MeshBuilder::triangles(&xyz).colors(&xyz[..9]).insert(&mut scene),
            Err(Error::LengthMismatch(_))
        ));
        assert_eq!(
            MeshBuilder::triangles(&xyz).indices(&[0, 1, 6]).insert(&mut scene),
            Err(Error::IndexOutOfRange { index: 6, vertices: 6 })
        );
        assert_eq!(
            MeshBuilder::triangles(&xyz).min_per_leaf(0).insert(&mut scene),
            Err(Error::Index(arbor_index::Error::InvalidMinSize))
        );
    }

    #[test]
    fn quad_batches_pick_both_halves() {
        let xyz = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let batch = LeafBatch::new(PrimitiveKind::Quads, xyz.to_vec(), None, None).unwrap();
        let down = |x: f64, y: f64| Segment::new(DVec3::new(x, y, 1.0), DVec3::new(x, y, -1.0));
        assert_eq!(batch.intersect_segment(&down(0.2, 0.7)).len(), 1);
        assert_eq!(batch.intersect_segment(&down(0.7, 0.2)).len(), 1);
        assert!(batch.intersect_segment(&down(1.5, 0.5)).is_empty());
    }

    #[test]
    fn quad_diagonal_hits_once() {
        let xyz = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        let batch = LeafBatch::new(PrimitiveKind::Quads, xyz.to_vec(), None, None).unwrap();
        for t in [0.25, 0.5, 0.75] {
            let down = Segment::new(DVec3::new(t, t, 1.0), DVec3::new(t, t, -1.0));
            let hits = batch.intersect_segment(&down);
            assert_eq!(hits.len(), 1, "one hit on the diagonal at {t}");
            assert!(hits[0].distance(DVec3::new(t, t, 0.0)) < 1e-12);
        }
    }

    #[test]
    fn batch_rejects_ragged_arrays() {
        let xyz = vec![0.0; 9];
        assert!(LeafBatch::new(PrimitiveKind::Triangles, xyz.clone(), Some(vec![0.0; 3]), None).is_err());
        assert!(LeafBatch::new(PrimitiveKind::Quads, xyz, None, None).is_err());
    }
}
