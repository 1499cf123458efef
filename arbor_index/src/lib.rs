// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=arbor_index --heading-base-level=0

//! Arbor Index: bounding volumes and a median-split bounding box tree in 3D.
//!
//! Arbor Index is the geometric layer underneath the Arbor scene graph.
//!
//! - [`BoundingBox`] and [`BoundingSphere`] with explicit *empty* and *infinite* states.
//! - [`Segment`] for pick rays, with sphere and double-sided triangle intersection.
//! - [`Plane`] for frustum culling, transformable by the inverse of a frame change.
//! - [`BoundingBoxTree`], a k-d-tree-like binary partition of a point set built by
//!   recursive median splits along the widest axis.
//!
//! Coordinates come in as packed `f32` arrays, the way vertex buffers store them;
//! all derived geometry is computed in `f64` using [`glam`] types.
//!
//! # Example
//!
//! ```rust
//! use arbor_index::{Axis, BoundingBoxTree};
//!
//! // Four points in the z = 0 plane.
//! let xyz = [
//!     0.0, 0.0, 0.0, //
//!     1.0, 0.0, 0.0, //
//!     0.0, 1.0, 0.0, //
//!     1.0, 1.0, 0.0, //
//! ];
//! let tree = BoundingBoxTree::new(1, &xyz).unwrap();
//!
//! // The root is split along x (ties between x and y go to x).
//! let root = tree.node(tree.root());
//! assert_eq!(root.split().map(|(axis, _)| axis), Some(Axis::X));
//!
//! // Every leaf holds a single point, and the leaves tile the permutation.
//! assert_eq!(tree.leaves().count(), 4);
//! ```
//!
//! Leaf ranges index into [`BoundingBoxTree::indices`], so callers can gather
//! whatever per-point data they keep alongside the coordinates:
//!
//! ```rust
//! use arbor_index::BoundingBoxTree;
//!
//! let xyz: Vec<f32> = (0..300).map(|i| i as f32).collect();
//! let tree = BoundingBoxTree::new(16, &xyz).unwrap();
//! let total: usize = tree.leaves().map(|leaf| tree.node_indices(leaf).len()).sum();
//! assert_eq!(total, 100);
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs in coordinates. Debug builds assert the median
//! partition after each split.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod error;
pub mod plane;
pub mod segment;
pub mod select;
pub mod tree;
pub mod types;

pub use error::{Error, Result};
pub use plane::{Plane, Side};
pub use segment::Segment;
pub use select::partial_index_sort;
pub use tree::{BoundingBoxTree, TreeNode, TreeNodeId};
pub use types::{Axis, BoundingBox, BoundingSphere};
