// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Median-split bounding box tree over a point set.

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::select::partial_index_sort;
use crate::types::{Axis, BoundingBox};

/// Identifier of a node in a [`BoundingBoxTree`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeNodeId(usize);

impl TreeNodeId {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    const fn get(self) -> usize {
        self.0
    }
}

/// A node of a [`BoundingBoxTree`].
#[derive(Clone, Debug)]
pub struct TreeNode {
    bbox: BoundingBox,
    kmin: usize,
    kmax: usize,
    children: Option<(TreeNodeId, TreeNodeId)>,
    split: Option<(Axis, f64)>,
}

impl TreeNode {
    /// Bounds of every point in this node's range.
    pub const fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Number of points in this node.
    pub const fn size(&self) -> usize {
        self.kmax - self.kmin
    }

    /// Half-open range of this node's points within [`BoundingBoxTree::indices`].
    pub const fn range(&self) -> core::ops::Range<usize> {
        self.kmin..self.kmax
    }

    /// Left child; `None` for leaves.
    pub fn left(&self) -> Option<TreeNodeId> {
        self.children.map(|(l, _)| l)
    }

    /// Right child; `None` for leaves.
    pub fn right(&self) -> Option<TreeNodeId> {
        self.children.map(|(_, r)| r)
    }

    /// True if this node has no children.
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The axis and median value this node was split at; `None` for leaves.
    pub const fn split(&self) -> Option<(Axis, f64)> {
        self.split
    }
}

/// A binary tree that recursively halves a point set at the median of its
/// widest axis.
///
/// Each node covers a contiguous range of a shared index permutation. A node
/// is split while half its size is at least `min_size`, so leaves hold between
/// `min_size` and `2 * min_size - 1` points, except that a tree over fewer
/// than `2 * min_size` points is a single leaf.
///
/// Child boxes are the parent box cut at the split plane: the left child keeps
/// the parent box with its maximum along the split axis lowered to the median,
/// and the right child keeps it with its minimum raised to the median.
#[derive(Clone, Debug)]
pub struct BoundingBoxTree {
    min_size: usize,
    indices: Vec<usize>,
    nodes: Vec<TreeNode>,
}

impl BoundingBoxTree {
    /// Build a tree over points packed as `(x, y, z)` triples.
    pub fn new(min_size: usize, xyz: &[f32]) -> Result<Self> {
        if xyz.len() % 3 != 0 {
            return Err(Error::LengthMismatch(format!(
                "packed coordinate length {} is not a multiple of 3",
                xyz.len()
            )));
        }
        let mut x = Vec::with_capacity(xyz.len() / 3);
        let mut y = Vec::with_capacity(xyz.len() / 3);
        let mut z = Vec::with_capacity(xyz.len() / 3);
        for p in xyz.chunks_exact(3) {
            x.push(p[0]);
            y.push(p[1]);
            z.push(p[2]);
        }
        Self::from_axes(min_size, &x, &y, &z)
    }

    /// Build a tree over points given as separate coordinate arrays.
    pub fn from_axes(min_size: usize, x: &[f32], y: &[f32], z: &[f32]) -> Result<Self> {
        if min_size == 0 {
            return Err(Error::InvalidMinSize);
        }
        if x.len() != y.len() || x.len() != z.len() {
            return Err(Error::LengthMismatch(format!(
                "x has {} values, y has {}, z has {}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        let n = x.len();
        let mut tree = Self {
            min_size,
            indices: (0..n).collect(),
            nodes: Vec::new(),
        };
        let root = tree.push(BoundingBox::from_axes(x, y, z), 0, n);
        tree.split(root, [x, y, z]);
        tracing::debug!(
            points = n,
            min_size,
            nodes = tree.nodes.len(),
            leaves = tree.leaves().count(),
            depth = tree.depth(),
            "built bounding box tree"
        );
        Ok(tree)
    }

    fn push(&mut self, bbox: BoundingBox, kmin: usize, kmax: usize) -> TreeNodeId {
        let id = TreeNodeId::new(self.nodes.len());
        self.nodes.push(TreeNode {
            bbox,
            kmin,
            kmax,
            children: None,
            split: None,
        });
        id
    }

    fn split(&mut self, root: TreeNodeId, axes: [&[f32]; 3]) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.get()];
            let (bbox, kmin, kmax) = (node.bbox, node.kmin, node.kmax);
            let n = kmax - kmin;
            if n / 2 < self.min_size {
                continue;
            }
            let axis = bbox.longest_axis();
            let keys = axes[axis.index()];
            let half = n / 2;
            let kmid = kmin + half;
            partial_index_sort(half, keys, &mut self.indices[kmin..kmax]);
            let median = f64::from(keys[self.indices[kmid]]);
            debug_assert!(
                self.is_partitioned(keys, kmin, kmid, kmax),
                "median split left an unordered range"
            );

            let left = self.push(bbox.with_max(axis, median), kmin, kmid);
            let right = self.push(bbox.with_min(axis, median), kmid, kmax);
            let node = &mut self.nodes[id.get()];
            node.children = Some((left, right));
            node.split = Some((axis, median));
            // Right first so the left subtree is split first.
            stack.push(right);
            stack.push(left);
        }
    }

    fn is_partitioned(&self, keys: &[f32], kmin: usize, kmid: usize, kmax: usize) -> bool {
        let m = keys[self.indices[kmid]];
        self.indices[kmin..kmid].iter().all(|&i| keys[i] <= m)
            && self.indices[kmid..kmax].iter().all(|&i| keys[i] >= m)
    }

    /// The minimum leaf size this tree was built with.
    pub const fn min_size(&self) -> usize {
        self.min_size
    }

    /// The root node. Always present, even for an empty point set.
    pub const fn root(&self) -> TreeNodeId {
        TreeNodeId::new(0)
    }

    /// Look up a node.
    ///
    /// Node ids are only meaningful for the tree that produced them.
    pub fn node(&self, id: TreeNodeId) -> &TreeNode {
        &self.nodes[id.get()]
    }

    /// The point permutation; every node covers a contiguous range of it.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// The point indices covered by a node.
    pub fn node_indices(&self, id: TreeNodeId) -> &[usize] {
        &self.indices[self.node(id).range()]
    }

    /// Number of points in the tree.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Leaves in left-to-right order; their ranges tile `0..size()`.
    pub fn leaves(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        let mut stack = vec![self.root()];
        core::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                match self.node(id).children {
                    Some((l, r)) => {
                        stack.push(r);
                        stack.push(l);
                    }
                    None => return Some(id),
                }
            }
            None
        })
    }

    /// Number of levels; a single-leaf tree has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root(), 1)];
        while let Some((id, d)) = stack.pop() {
            deepest = deepest.max(d);
            if let Some((l, r)) = self.node(id).children {
                stack.push((l, d + 1));
                stack.push((r, d + 1));
            }
        }
        deepest
    }
}
