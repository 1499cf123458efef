// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene basics.
//!
//! Build a height-field mesh inside a world, move it with a transform group,
//! cull it against two views, and replay the draw list into a recorder.
//!
//! Run:
//! - `RUST_LOG=arbor_scene=debug cargo run -p arbor_demos --example scene_basics`

use arbor_scene::{CullContext, DrawContext, Grid, MeshBuilder, Recorder, Rgb, Scene, StateSet, View};
use glam::{DMat4, DVec3};
use kurbo::Size;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // A 65 by 65 sampled ripple over [-1, 1]^2.
    let n = 65;
    let axis: Vec<f32> = (0..n).map(|i| -1.0 + 2.0 * i as f32 / (n - 1) as f32).collect();
    let mut z = Vec::with_capacity(n * n);
    for &x in &axis {
        for &y in &axis {
            let r = (x * x + y * y).sqrt();
            z.push(0.1 * (6.0 * r).cos());
        }
    }
    let grid = Grid::new(&axis, &axis, &z).unwrap();
    let xyz = grid.triangles();

    let mut scene = Scene::new();
    let world = scene.insert_world();
    let lift = scene.insert_transform_group(DMat4::from_translation(DVec3::new(0.0, 0.0, 0.5)));
    scene.add_child(world, lift).unwrap();
    let mesh = MeshBuilder::triangles(&xyz)
        .min_per_leaf(512)
        .states(StateSet::mesh_default().with_color(Rgb::new(0.3, 0.6, 0.9)))
        .insert(&mut scene)
        .unwrap();
    scene.add_child(lift, mesh).unwrap();

    let stats = scene.mesh_stats(mesh).unwrap();
    tracing::info!(
        primitives = stats.primitives,
        batches = stats.batches,
        "built mesh group"
    );
    tracing::info!("world bounds: {:?}", scene.bounding_sphere(world, true).unwrap());

    // Looking at the whole surface, then zoomed into one corner.
    let eye = DVec3::new(0.0, 0.0, 4.0);
    let wide = View::new(
        DMat4::look_at_rh(eye, DVec3::ZERO, DVec3::Y),
        DMat4::perspective_rh_gl(0.8, 1.5, 0.1, 20.0),
        Size::new(960.0, 640.0),
    );
    let narrow = View::new(
        DMat4::look_at_rh(DVec3::new(0.8, 0.8, 2.0), DVec3::new(0.8, 0.8, 0.0), DVec3::Y),
        DMat4::perspective_rh_gl(0.2, 1.5, 0.1, 20.0),
        Size::new(960.0, 640.0),
    );

    for (name, view) in [("wide", wide), ("narrow", narrow)] {
        let mut cull = CullContext::new(view);
        cull.traverse(&mut scene, world).unwrap();
        let list = cull.into_draw_list();

        let mut recorder = Recorder::new();
        DrawContext::new(view, &mut recorder)
            .draw(&scene, &list)
            .unwrap();
        tracing::info!(
            "{name}: {} of {} batches visible, {} draw calls, {} primitives drawn",
            list.len(),
            stats.batches,
            recorder.draw_calls(),
            recorder.primitives_drawn()
        );
    }

    // Moving the mesh only recomputes the path to the root.
    let before = scene.bounds_computations();
    scene
        .set_transform(lift, DMat4::from_translation(DVec3::new(0.0, 0.0, -0.5)))
        .unwrap();
    scene.bounding_sphere(world, true).unwrap();
    tracing::info!(
        "after moving: {} bounding spheres recomputed",
        scene.bounds_computations() - before
    );
}
