// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounding box tree basics.
//!
//! Split a small point cloud with median splits and print the leaves.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p arbor_demos --example bbox_tree_basics`

use arbor_index::BoundingBoxTree;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // A 4 by 4 by 2 lattice, wider in x than in y.
    let mut xyz = Vec::new();
    for ix in 0..4 {
        for iy in 0..4 {
            for iz in 0..2 {
                xyz.extend_from_slice(&[2.0 * ix as f32, iy as f32, iz as f32]);
            }
        }
    }

    let tree = BoundingBoxTree::new(4, &xyz).unwrap();
    tracing::info!(
        "{} points, {} nodes, depth {}",
        tree.size(),
        tree.node_count(),
        tree.depth()
    );
    if let Some((axis, value)) = tree.node(tree.root()).split() {
        tracing::info!("root split: {axis:?} at {value}");
    }
    for leaf in tree.leaves() {
        let node = tree.node(leaf);
        tracing::info!(
            "leaf {:?}: points {:?}, box {:?}..{:?}",
            node.range(),
            tree.node_indices(leaf),
            node.bounding_box().min(),
            node.bounding_box().max()
        );
    }
    let total: usize = tree.leaves().map(|leaf| tree.node_indices(leaf).len()).sum();
    assert_eq!(total, tree.size(), "leaves partition the points");
}
