// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Picking: which primitives lie under a pixel.

use arbor_index::Segment;
use glam::DVec3;
use kurbo::Point;

use crate::error::{Error, Result};
use crate::scene::{NodeKind, Scene};
use crate::types::{NodeFlags, NodeId};
use crate::view::{TransformContext, View};

/// One intersection of the pick segment with a leaf batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PickResult {
    /// The leaf that was hit.
    pub node: NodeId,
    /// Path from the traversal root to `node` (inclusive).
    pub path: Vec<NodeId>,
    /// Hit point in the leaf's coordinates.
    pub local_point: DVec3,
    /// Hit point in world coordinates.
    pub world_point: DVec3,
    /// Depth of the hit in pixel coordinates; smaller is nearer.
    pub pixel_z: f64,
}

/// Intersects the line of sight through a pixel with a scene.
///
/// The segment runs from the pixel on the near plane to the pixel on the far
/// plane and is carried into each transform group's local frame on the way
/// down. Subtrees whose bounding sphere misses the segment are skipped.
#[derive(Clone, Debug)]
pub struct PickContext {
    transforms: TransformContext,
    segment: Segment,
    segment_stack: Vec<Segment>,
    path: Vec<NodeId>,
    results: Vec<PickResult>,
}

impl PickContext {
    /// A context picking through `pixel` in `view`.
    pub fn new(view: View, pixel: Point) -> Self {
        let pixel_to_world = view.pixel_to_world();
        let segment = Segment::new(
            pixel_to_world.project_point3(DVec3::new(pixel.x, pixel.y, 0.0)),
            pixel_to_world.project_point3(DVec3::new(pixel.x, pixel.y, 1.0)),
        );
        Self {
            transforms: TransformContext::new(view),
            segment,
            segment_stack: Vec::new(),
            path: Vec::new(),
            results: Vec::new(),
        }
    }

    /// The pick segment in the current local frame.
    pub const fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Whether the segment reaches `id`'s bounding sphere.
    pub fn segment_intersects(&self, scene: &mut Scene, id: NodeId) -> Result<bool> {
        let bs = scene.bounding_sphere(id, false)?;
        Ok(self.segment.intersects_sphere(&bs))
    }

    /// Pick the subtree rooted at `root`, treated as lying in world coordinates.
    pub fn pick(&mut self, scene: &mut Scene, root: NodeId) -> Result<()> {
        let before = self.results.len();
        self.visit(scene, root)?;
        tracing::debug!(?root, hits = self.results.len() - before, "pick finished");
        Ok(())
    }

    fn visit(&mut self, scene: &mut Scene, id: NodeId) -> Result<()> {
        let flags = scene.flags(id).ok_or(Error::StaleNode(id))?;
        if !flags.contains(NodeFlags::VISIBLE | NodeFlags::PICKABLE) {
            return Ok(());
        }
        if !self.segment_intersects(scene, id)? {
            return Ok(());
        }

        self.path.push(id);
        match scene.kind(id) {
            Some(NodeKind::Batch(batch)) => {
                let hits = batch.intersect_segment(&self.segment);
                self.record(id, hits);
            }
            Some(NodeKind::Transform(m)) => {
                let m = *m;
                self.segment_stack.push(self.segment);
                self.segment = self.segment.transformed(&m.inverse());
                self.transforms.push_local_to_world(&m);
                for child in scene.children(id).to_vec() {
                    self.visit(scene, child)?;
                }
                self.transforms.pop_local_to_world();
                if let Some(segment) = self.segment_stack.pop() {
                    self.segment = segment;
                }
            }
            Some(_) => {
                for child in scene.children(id).to_vec() {
                    self.visit(scene, child)?;
                }
            }
            None => {}
        }
        self.path.pop();
        Ok(())
    }

    fn record(&mut self, node: NodeId, hits: Vec<DVec3>) {
        let local_to_world = self.transforms.local_to_world();
        let world_to_pixel = self.transforms.view().world_to_pixel();
        for local_point in hits {
            let world_point = local_to_world.transform_point3(local_point);
            let pixel_z = world_to_pixel.project_point3(world_point).z;
            tracing::trace!(?node, ?world_point, pixel_z, "pick hit");
            self.results.push(PickResult {
                node,
                path: self.path.clone(),
                local_point,
                world_point,
                pixel_z,
            });
        }
    }

    /// Every hit found so far, in traversal order.
    pub fn results(&self) -> &[PickResult] {
        &self.results
    }

    /// The hit nearest to the viewer.
    pub fn closest(&self) -> Option<&PickResult> {
        self.results
            .iter()
            .min_by(|a, b| a.pixel_z.total_cmp(&b.pixel_z))
    }

    /// Consume the context, returning its hits.
    pub fn into_results(self) -> Vec<PickResult> {
        self.results
    }
}
