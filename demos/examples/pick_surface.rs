// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pick and select.
//!
//! Stack two quad meshes, pick through a pixel, select the nearest mesh, and
//! show the outline pass in the recorded draw commands.
//!
//! Run:
//! - `RUST_LOG=arbor_scene=debug cargo run -p arbor_demos --example pick_surface`

use arbor_scene::{
    Command, CullContext, DrawContext, Grid, MeshBuilder, NodeId, PickContext, Recorder, Scene,
    View,
};
use glam::{DMat4, DVec3};
use kurbo::{Point, Size};
use tracing_subscriber::EnvFilter;

fn flat_sheet(scene: &mut Scene, height: f32) -> NodeId {
    let axis = [0.0, 0.25, 0.5, 0.75, 1.0];
    let z = [height; 25];
    let xyz = Grid::new(&axis, &axis, &z).unwrap().quads();
    MeshBuilder::quads(&xyz).insert(scene).unwrap()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut scene = Scene::new();
    let world = scene.insert_world();
    let low = flat_sheet(&mut scene, 0.0);
    let high = flat_sheet(&mut scene, 0.5);
    scene.add_child(world, low).unwrap();
    scene.add_child(world, high).unwrap();

    let view = View::new(
        DMat4::look_at_rh(DVec3::new(0.5, 0.5, 5.0), DVec3::new(0.5, 0.5, 0.0), DVec3::Y),
        DMat4::perspective_rh_gl(0.6, 1.0, 0.1, 20.0),
        Size::new(400.0, 400.0),
    );

    let pixel = Point::new(180.0, 220.0);
    let mut pick = PickContext::new(view, pixel);
    pick.pick(&mut scene, world).unwrap();
    for hit in pick.results() {
        tracing::info!(
            "hit {:?} at {:?} (depth {:.6})",
            hit.node, hit.world_point, hit.pixel_z
        );
    }
    let Some(nearest) = pick.closest() else {
        tracing::info!("nothing under {pixel:?}");
        return;
    };

    // Select the selectable mesh group containing the hit.
    let target = nearest
        .path
        .iter()
        .rev()
        .copied()
        .find(|&id| scene.is_selectable(id))
        .unwrap();
    scene.clear_selected_except(world, Some(target)).unwrap();
    scene.set_selected(target, true).unwrap();
    assert_eq!(target, high, "the upper sheet is nearer the eye");
    tracing::info!(
        "selected {target:?}; world has {} selected",
        scene.count_selected(world).unwrap()
    );

    let mut cull = CullContext::new(view);
    cull.traverse(&mut scene, world).unwrap();
    let list = cull.into_draw_list();
    let mut recorder = Recorder::new();
    DrawContext::new(view, &mut recorder)
        .draw(&scene, &list)
        .unwrap();
    let outlines = recorder
        .commands()
        .iter()
        .filter(|c| matches!(c, Command::SetPolygonOffset(Some(_))))
        .count();
    tracing::info!(
        "{} batches drawn with {} draw calls, {} outlined",
        list.len(),
        recorder.draw_calls(),
        outlines
    );
}
