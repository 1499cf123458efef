// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing a culled draw list through a [`Renderer`].

use crate::cull::DrawList;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::scene::{NodeKind, Scene};
use crate::state::RenderState;
use crate::types::{NodeId, PolygonMode, Rgb};
use crate::view::{TransformContext, View};

/// Depth offset applied to the filled pass of a selected batch so that its
/// outline wins the depth test.
const SELECTED_POLYGON_OFFSET: (f32, f32) = (1.0, 1.0);

#[derive(Copy, Clone, Debug)]
struct Frame {
    node: NodeId,
    state: RenderState,
    selected: bool,
    pushed_transform: bool,
}

/// Replays a [`DrawList`] into a renderer.
///
/// Consecutive paths usually share a prefix; only the part of each path
/// that differs from the previous one is left and re-entered. Entering a
/// node pushes its transform and merges its states over the inherited ones.
pub struct DrawContext<'r, R: Renderer + ?Sized> {
    transforms: TransformContext,
    renderer: &'r mut R,
    frames: Vec<Frame>,
}

impl<R: Renderer + ?Sized> core::fmt::Debug for DrawContext<'_, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DrawContext")
            .field("transforms", &self.transforms)
            .field("depth", &self.frames.len())
            .finish_non_exhaustive()
    }
}

impl<'r, R: Renderer + ?Sized> DrawContext<'r, R> {
    /// A context drawing `view` into `renderer`.
    pub fn new(view: View, renderer: &'r mut R) -> Self {
        Self {
            transforms: TransformContext::new(view),
            renderer,
            frames: Vec::new(),
        }
    }

    /// The renderer being drawn into.
    pub fn renderer(&mut self) -> &mut R {
        &mut *self.renderer
    }

    /// Draw every leaf of `list`.
    ///
    /// On error, drawing stops and every entered frame is left again, so the
    /// context can be reused.
    pub fn draw(&mut self, scene: &Scene, list: &DrawList) -> Result<()> {
        let result = self.draw_paths(scene, list);
        while !self.frames.is_empty() {
            self.end();
        }
        result?;
        tracing::debug!(leaves = list.len(), "draw finished");
        Ok(())
    }

    fn draw_paths(&mut self, scene: &Scene, list: &DrawList) -> Result<()> {
        for path in list.iter() {
            let Some((&leaf, groups)) = path.split_last() else {
                continue;
            };
            let common = self
                .frames
                .iter()
                .zip(groups)
                .take_while(|(frame, id)| frame.node == **id)
                .count();
            while self.frames.len() > common {
                self.end();
            }
            for &id in &groups[common..] {
                self.begin(scene, id)?;
            }
            self.draw_leaf(scene, leaf)?;
        }
        Ok(())
    }

    fn inherited(&self) -> (RenderState, bool) {
        self.frames
            .last()
            .map_or((RenderState::default(), false), |f| (f.state, f.selected))
    }

    fn resolve(&self, scene: &Scene, id: NodeId) -> Result<(RenderState, bool)> {
        if !scene.is_alive(id) {
            return Err(Error::StaleNode(id));
        }
        let (state, selected) = self.inherited();
        let state = match scene.states(id) {
            Some(states) => state.merged(states),
            None => state,
        };
        Ok((state, selected || scene.is_selected(id)))
    }

    fn begin(&mut self, scene: &Scene, id: NodeId) -> Result<()> {
        let (state, selected) = self.resolve(scene, id)?;
        let transform = scene.transform(id);
        if let Some(m) = &transform {
            self.transforms.push_local_to_world(m);
        }
        self.frames.push(Frame {
            node: id,
            state,
            selected,
            pushed_transform: transform.is_some(),
        });
        Ok(())
    }

    fn end(&mut self) {
        if let Some(frame) = self.frames.pop()
            && frame.pushed_transform
        {
            self.transforms.pop_local_to_world();
        }
    }

    fn draw_leaf(&mut self, scene: &Scene, id: NodeId) -> Result<()> {
        let (state, selected) = self.resolve(scene, id)?;
        let Some(NodeKind::Batch(batch)) = scene.kind(id) else {
            return Ok(());
        };
        let r = &mut *self.renderer;
        r.load_transform(&self.transforms.local_to_view());
        state.apply(&mut *r);
        r.begin_batch(batch.vertices(), batch.normals(), batch.colors());
        if selected {
            r.set_polygon_offset(Some(SELECTED_POLYGON_OFFSET));
        }
        r.draw_batch(batch.kind(), batch.count());
        if selected {
            r.end_batch();
            r.begin_batch(batch.vertices(), None, None);
            r.set_polygon_mode(PolygonMode::Line);
            r.set_lighting(false);
            r.set_color(Rgb::WHITE);
            r.draw_batch(batch.kind(), batch.count());
            r.set_polygon_offset(None);
        }
        r.end_batch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::LeafBatch;
    use crate::cull::CullContext;
    use crate::render::{Command, Recorder};
    use crate::state::{Material, StateSet};
    use crate::types::{NodeFlags, PrimitiveKind};
    use glam::{DMat4, DVec3};
    use kurbo::Size;

    fn view() -> View {
        View::new(
            DMat4::from_translation(DVec3::new(0.0, 0.0, -5.0)),
            DMat4::orthographic_rh_gl(-2.0, 2.0, -2.0, 2.0, 0.1, 10.0),
            Size::new(100.0, 100.0),
        )
    }

    fn triangle() -> LeafBatch {
        let xyz = vec![0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0];
        LeafBatch::new(PrimitiveKind::Triangles, xyz, None, None).unwrap()
    }

    fn cull(scene: &mut Scene, root: NodeId) -> DrawList {
        let mut cx = CullContext::new(view());
        cx.traverse(scene, root).unwrap();
        cx.into_draw_list()
    }

    #[test]
    fn leaf_draws_with_merged_state() {
        let red = Rgb::new(1.0, 0.0, 0.0);
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let g = scene.insert_group();
        let leaf = scene.insert_batch(triangle());
        scene.add_child(world, g).unwrap();
        scene.add_child(g, leaf).unwrap();
        scene.set_states(g, StateSet::default().with_color(red)).unwrap();

        let list = cull(&mut scene, world);
        let mut recorder = Recorder::new();
        DrawContext::new(view(), &mut recorder).draw(&scene, &list).unwrap();

        assert_eq!(
            recorder.commands(),
            [
                Command::LoadTransform(view().world_to_view),
                Command::SetColor(red),
                Command::SetLighting(true),
                Command::SetTwoSided(false),
                Command::SetPolygonMode(PolygonMode::Fill),
                Command::SetMaterial(Material::default()),
                Command::BeginBatch {
                    vertices: 9,
                    normals: false,
                    colors: false
                },
                Command::DrawBatch(PrimitiveKind::Triangles, 1),
                Command::EndBatch,
            ]
        );
    }

    #[test]
    fn selected_batches_get_an_outline_pass() {
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let g = scene.insert_group();
        let leaf = scene.insert_batch(triangle());
        scene.add_child(world, g).unwrap();
        scene.add_child(g, leaf).unwrap();
        scene
            .set_flags(g, NodeFlags::default() | NodeFlags::SELECTABLE)
            .unwrap();
        scene.set_selected(g, true).unwrap();

        let list = cull(&mut scene, world);
        let mut recorder = Recorder::new();
        DrawContext::new(view(), &mut recorder).draw(&scene, &list).unwrap();

        assert_eq!(recorder.draw_calls(), 2);
        let tail = &recorder.commands()[6..];
        assert_eq!(
            tail,
            [
                Command::BeginBatch {
                    vertices: 9,
                    normals: false,
                    colors: false
                },
                Command::SetPolygonOffset(Some((1.0, 1.0))),
                Command::DrawBatch(PrimitiveKind::Triangles, 1),
                Command::EndBatch,
                Command::BeginBatch {
                    vertices: 9,
                    normals: false,
                    colors: false
                },
                Command::SetPolygonMode(PolygonMode::Line),
                Command::SetLighting(false),
                Command::SetColor(Rgb::WHITE),
                Command::DrawBatch(PrimitiveKind::Triangles, 1),
                Command::SetPolygonOffset(None),
                Command::EndBatch,
            ]
        );
    }

    #[test]
    fn siblings_share_the_transform_prefix() {
        let offset = DMat4::from_translation(DVec3::new(0.25, 0.0, 0.0));
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let t = scene.insert_transform_group(offset);
        let a = scene.insert_batch(triangle());
        let b = scene.insert_batch(triangle());
        scene.add_child(world, t).unwrap();
        scene.add_child(t, a).unwrap();
        scene.add_child(t, b).unwrap();

        let list = cull(&mut scene, world);
        assert_eq!(list.len(), 2);
        let mut recorder = Recorder::new();
        let mut dc = DrawContext::new(view(), &mut recorder);
        dc.draw(&scene, &list).unwrap();
        assert_eq!(dc.transforms.depth(), 0);

        let loads: Vec<&Command> = recorder
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::LoadTransform(_)))
            .collect();
        let expected = Command::LoadTransform(view().world_to_view * offset);
        assert_eq!(loads, [&expected, &expected]);
        assert_eq!(recorder.primitives_drawn(), 2);
    }

    #[test]
    fn stale_path_is_an_error() {
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let leaf = scene.insert_batch(triangle());
        scene.add_child(world, leaf).unwrap();
        let list = cull(&mut scene, world);
        scene.remove(leaf).unwrap();

        let mut recorder = Recorder::new();
        let result = DrawContext::new(view(), &mut recorder).draw(&scene, &list);
        assert_eq!(result, Err(Error::StaleNode(leaf)));
    }

    #[test]
    fn failed_draw_leaves_the_context_reusable() {
        let offset = DMat4::from_translation(DVec3::new(0.25, 0.0, 0.0));
        let mut scene = Scene::new();
        let world = scene.insert_world();
        let t = scene.insert_transform_group(offset);
        let gone = scene.insert_batch(triangle());
        scene.add_child(world, t).unwrap();
        scene.add_child(t, gone).unwrap();
        let stale = cull(&mut scene, world);
        scene.remove(gone).unwrap();

        let other = scene.insert_transform_group(DMat4::IDENTITY);
        let leaf = scene.insert_batch(triangle());
        scene.add_child(world, other).unwrap();
        scene.add_child(other, leaf).unwrap();
        let fresh = cull(&mut scene, world);

        let mut recorder = Recorder::new();
        let mut dc = DrawContext::new(view(), &mut recorder);
        assert_eq!(dc.draw(&scene, &stale), Err(Error::StaleNode(gone)));
        assert!(dc.frames.is_empty());
        assert_eq!(dc.transforms.depth(), 0, "pushed transforms are popped");

        dc.draw(&scene, &fresh).unwrap();
        let loads: Vec<Command> = dc
            .renderer()
            .take()
            .into_iter()
            .filter(|c| matches!(c, Command::LoadTransform(_)))
            .collect();
        assert_eq!(loads, [Command::LoadTransform(view().world_to_view)]);
    }
}
