// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! View-frustum culling into a draw list.

use arbor_index::{BoundingSphere, Plane, Side};
use glam::DMat4;

use crate::error::{Error, Result};
use crate::scene::{NodeKind, Scene};
use crate::types::{NodeFlags, NodeId};
use crate::view::{TransformContext, View};

/// All six frustum planes active.
const ALL_PLANES: u8 = 0b0011_1111;

/// The faces of the normalized device cube, facing inwards:
/// right, left, top, bottom, near, far.
fn cube_planes() -> [Plane; 6] {
    [
        Plane::new(-1.0, 0.0, 0.0, 1.0),
        Plane::new(1.0, 0.0, 0.0, 1.0),
        Plane::new(0.0, -1.0, 0.0, 1.0),
        Plane::new(0.0, 1.0, 0.0, 1.0),
        Plane::new(0.0, 0.0, -1.0, 1.0),
        Plane::new(0.0, 0.0, 1.0, 1.0),
    ]
}

/// Root-to-leaf paths of the leaves that survived culling, in traversal order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrawList {
    paths: Vec<Vec<NodeId>>,
}

impl DrawList {
    /// Create an empty draw list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the path to a visible leaf.
    pub fn push(&mut self, path: Vec<NodeId>) {
        self.paths.push(path);
    }

    /// Number of leaves in the list.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true if no leaf survived.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every path.
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    /// The paths, each starting at the traversal root and ending at a leaf.
    pub fn iter(&self) -> impl Iterator<Item = &[NodeId]> + '_ {
        self.paths.iter().map(Vec::as_slice)
    }
}

/// Culls a scene against a view frustum.
///
/// Each node's bounding sphere is tested in its parent's frame against the
/// frustum planes still active on the way down. A sphere wholly outside any
/// plane is culled together with its subtree; planes the sphere lies wholly
/// inside are not tested again below it.
#[derive(Clone, Debug)]
pub struct CullContext {
    transforms: TransformContext,
    planes: [Plane; 6],
    plane_stack: Vec<[Plane; 6]>,
    path: Vec<NodeId>,
    draw_list: DrawList,
}

impl CullContext {
    /// A context culling against the frustum of `view`.
    pub fn new(view: View) -> Self {
        let world_to_cube = view.world_to_cube();
        let planes = cube_planes().map(|p| p.transformed_with_inverse(&world_to_cube));
        Self {
            transforms: TransformContext::new(view),
            planes,
            plane_stack: Vec::new(),
            path: Vec::new(),
            draw_list: DrawList::new(),
        }
    }

    /// The transform stack.
    pub const fn transforms(&self) -> &TransformContext {
        &self.transforms
    }

    /// The frustum planes in the current local frame.
    pub const fn planes(&self) -> &[Plane; 6] {
        &self.planes
    }

    /// Test a sphere (in the current frame) against the planes in `active`.
    ///
    /// Returns `None` if the sphere is culled, and otherwise the planes that
    /// still need testing below it.
    pub fn frustum_intersects(&self, bs: &BoundingSphere, active: u8) -> Option<u8> {
        if bs.is_empty() {
            return None;
        }
        let mut remaining = active;
        for (i, plane) in self.planes.iter().enumerate() {
            let bit = 1 << i;
            if active & bit == 0 {
                continue;
            }
            match plane.classify(bs) {
                Side::Below => return None,
                Side::Above => remaining &= !bit,
                Side::Straddles => {}
            }
        }
        Some(remaining)
    }

    /// Cull the subtree rooted at `root`, appending visible leaves to the
    /// draw list. `root` is treated as lying in world coordinates.
    pub fn traverse(&mut self, scene: &mut Scene, root: NodeId) -> Result<()> {
        let before = self.draw_list.len();
        self.visit(scene, root, ALL_PLANES)?;
        tracing::debug!(
            ?root,
            leaves = self.draw_list.len() - before,
            total = self.draw_list.len(),
            "cull finished"
        );
        Ok(())
    }

    fn visit(&mut self, scene: &mut Scene, id: NodeId, active: u8) -> Result<()> {
        let flags = scene.flags(id).ok_or(Error::StaleNode(id))?;
        if !flags.contains(NodeFlags::VISIBLE) {
            return Ok(());
        }
        let bs = scene.bounding_sphere(id, false)?;
        let Some(active) = self.frustum_intersects(&bs, active) else {
            tracing::trace!(?id, "culled");
            return Ok(());
        };

        self.path.push(id);
        let transform = match scene.kind(id) {
            Some(NodeKind::Batch(_)) => {
                self.draw_list.push(self.path.clone());
                None
            }
            Some(NodeKind::Transform(m)) => Some(*m),
            _ => None,
        };
        if let Some(m) = transform {
            self.push_transform(&m, active);
        }
        for child in scene.children(id).to_vec() {
            self.visit(scene, child, active)?;
        }
        if transform.is_some() {
            self.pop_transform();
        }
        self.path.pop();
        Ok(())
    }

    fn push_transform(&mut self, local_to_parent: &DMat4, active: u8) {
        self.plane_stack.push(self.planes);
        for (i, plane) in self.planes.iter_mut().enumerate() {
            if active & (1 << i) != 0 {
                *plane = plane.transformed_with_inverse(local_to_parent);
            }
        }
        self.transforms.push_local_to_world(local_to_parent);
    }

    fn pop_transform(&mut self) {
        if let Some(planes) = self.plane_stack.pop() {
            self.planes = planes;
        }
        self.transforms.pop_local_to_world();
    }

    /// The draw list built so far.
    pub const fn draw_list(&self) -> &DrawList {
        &self.draw_list
    }

    /// Consume the context, returning its draw list.
    pub fn into_draw_list(self) -> DrawList {
        self.draw_list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::LeafBatch;
    use crate::types::PrimitiveKind;
    use glam::DVec3;
    use kurbo::Size;

    /// Looking down -z from `z = 5` at the square `[-2, 2]^2`.
    fn view() -> View {
        View::new(
            DMat4::from_translation(DVec3::new(0.0, 0.0, -5.0)),
            DMat4::orthographic_rh_gl(-2.0, 2.0, -2.0, 2.0, 0.1, 10.0),
            Size::new(100.0, 100.0),
        )
    }

    fn triangle_at(x: f32) -> LeafBatch {
        let xyz = vec![x, 0.0, 0.0, x + 0.5, 0.0, 0.0, x, 0.5, 0.0];
        LeafBatch::new(PrimitiveKind::Triangles, xyz, None, None).unwrap()
    }

    #[test]
    fn planes_face_into_the_frustum() {
        let cx = CullContext::new(view());
        for plane in cx.planes() {
            assert!(plane.distance_to(DVec3::ZERO) > 0.0);
        }
        let far_away = BoundingSphere::new(DVec3::new(0.0, 0.0, -100.0), 1.0);
        assert_eq!(cx.frustum_intersects(&far_away, ALL_PLANES), None);
        let small = BoundingSphere::new(DVec3::ZERO, 0.1);
        assert_eq!(cx.frustum_intersects(&small, ALL_PLANES), Some(0));
        let big = BoundingSphere::new(DVec3::ZERO, 1.0e6);
        assert_eq!(cx.frustum_intersects(&big, ALL_PLANES), Some(ALL_PLANES));
        assert_eq!(cx.frustum_intersects(&BoundingSphere::Empty, 0), None);
        assert_eq!(
            cx.frustum_intersects(&BoundingSphere::Infinite, ALL_PLANES),
            Some(ALL_PLANES)
        );
    }

    #[test]
    fn only_leaves_inside_the_frustum_are_listed() {
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let inside = scene.insert_batch(triangle_at(0.0));
        let outside = scene.insert_batch(triangle_at(100.0));
        scene.add_child(world, inside).unwrap();
        scene.add_child(world, outside).unwrap();

        let mut cx = CullContext::new(view());
        cx.traverse(&mut scene, world).unwrap();
        let paths: Vec<&[NodeId]> = cx.draw_list().iter().collect();
        assert_eq!(paths, [&[world, inside][..]]);
    }

    #[test]
    fn transform_brings_a_leaf_into_view() {
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let t = scene.insert_transform_group(DMat4::from_translation(DVec3::new(-100.0, 0.0, 0.0)));
        let leaf = scene.insert_batch(triangle_at(100.0));
        scene.add_child(world, t).unwrap();
        scene.add_child(t, leaf).unwrap();

        let mut cx = CullContext::new(view());
        cx.traverse(&mut scene, world).unwrap();
        assert_eq!(cx.draw_list().len(), 1);
        assert_eq!(cx.transforms().depth(), 0, "transform stack unwinds");

        scene
            .set_transform(t, DMat4::from_translation(DVec3::new(0.0, 0.0, 50.0)))
            .unwrap();
        let mut cx = CullContext::new(view());
        cx.traverse(&mut scene, world).unwrap();
        assert!(cx.into_draw_list().is_empty());
    }

    #[test]
    fn perspective_frustum_widens_with_distance() {
        let view = View::new(
            DMat4::look_at_rh(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y),
            DMat4::perspective_rh_gl(60_f64.to_radians(), 1.0, 0.1, 100.0),
            Size::new(100.0, 100.0),
        );
        let at = |x: f32, z: f32| {
            let xyz = vec![x, 0.0, z, x + 0.5, 0.0, z, x, 0.5, z];
            LeafBatch::new(PrimitiveKind::Triangles, xyz, None, None).unwrap()
        };
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let center = scene.insert_batch(at(0.0, 0.0));
        // Outside a 2-unit-wide box, but inside the cone 25 units from the eye.
        let distant = scene.insert_batch(at(4.0, -20.0));
        let beside = scene.insert_batch(at(4.0, 0.0));
        let behind = scene.insert_batch(at(0.0, 10.0));
        for leaf in [center, distant, beside, behind] {
            scene.add_child(world, leaf).unwrap();
        }

        let mut cx = CullContext::new(view);
        cx.traverse(&mut scene, world).unwrap();
        let paths: Vec<&[NodeId]> = cx.draw_list().iter().collect();
        assert_eq!(paths, [&[world, center][..], &[world, distant][..]]);
    }

    #[test]
    fn invisible_and_empty_subtrees_are_skipped() {
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let hidden = scene.insert_group();
        let empty = scene.insert_group();
        let a = scene.insert_batch(triangle_at(0.0));
        let b = scene.insert_batch(triangle_at(0.5));
        scene.add_child(world, hidden).unwrap();
        scene.add_child(world, empty).unwrap();
        scene.add_child(hidden, a).unwrap();
        scene.add_child(world, b).unwrap();
        scene.set_flags(hidden, NodeFlags::PICKABLE).unwrap();

        let mut cx = CullContext::new(view());
        cx.traverse(&mut scene, world).unwrap();
        let paths: Vec<&[NodeId]> = cx.draw_list().iter().collect();
        assert_eq!(paths, [&[world, b][..]]);
    }

    #[test]
    fn stale_root_is_an_error() {
        let mut scene = Scene::new();
        let g = scene.insert_group();
        scene.remove(g).unwrap();
        let mut cx = CullContext::new(view());
        assert_eq!(cx.traverse(&mut scene, g), Err(Error::StaleNode(g)));
    }
}
