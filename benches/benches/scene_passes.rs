// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_scene::{CullContext, DrawContext, Grid, MeshBuilder, PickContext, Recorder, Scene, View};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use glam::{DMat4, DVec3};
use kurbo::{Point, Size};

/// A wavy height field on an `n` by `n` grid over `[0, 1]^2`.
fn height_field(n: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let axis: Vec<f32> = (0..n).map(|i| i as f32 / (n - 1) as f32).collect();
    let mut z = Vec::with_capacity(n * n);
    for &x in &axis {
        for &y in &axis {
            z.push(0.1 * (8.0 * x).sin() * (8.0 * y).cos());
        }
    }
    (axis.clone(), axis, z)
}

fn view() -> View {
    View::new(
        DMat4::look_at_rh(DVec3::new(0.5, 0.5, 3.0), DVec3::new(0.5, 0.5, 0.0), DVec3::Y),
        DMat4::perspective_rh_gl(0.5, 1.0, 0.1, 10.0),
        Size::new(512.0, 512.0),
    )
}

fn bench_mesh_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_build");
    for &n in &[64usize, 256] {
        let (x, y, z) = height_field(n);
        let grid = Grid::new(&x, &y, &z).unwrap();
        let xyz = grid.triangles();
        group.throughput(Throughput::Elements((2 * (n - 1) * (n - 1)) as u64));
        group.bench_function(format!("triangles_n{n}"), |b| {
            b.iter_batched(
                Scene::new,
                |mut scene| {
                    let mesh = MeshBuilder::triangles(&xyz).insert(&mut scene).unwrap();
                    black_box(scene.mesh_stats(mesh).unwrap());
                },
                BatchSize::SmallInput,
            );
        });
        let xyz = grid.quads();
        group.bench_function(format!("quads_flat_n{n}"), |b| {
            b.iter_batched(
                Scene::new,
                |mut scene| {
                    let mesh = MeshBuilder::quads(&xyz)
                        .vertex_normals(false)
                        .insert(&mut scene)
                        .unwrap();
                    black_box(mesh);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_traversals(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversals");
    let (x, y, z) = height_field(256);
    let xyz = Grid::new(&x, &y, &z).unwrap().triangles();
    let mut scene = Scene::new();
    let world = scene.insert_world();
    let mesh = MeshBuilder::triangles(&xyz)
        .min_per_leaf(256)
        .insert(&mut scene)
        .unwrap();
    scene.add_child(world, mesh).unwrap();
    let view = view();

    group.bench_function("cull", |b| {
        b.iter(|| {
            let mut cx = CullContext::new(view);
            cx.traverse(&mut scene, world).unwrap();
            black_box(cx.draw_list().len());
        });
    });

    let mut cx = CullContext::new(view);
    cx.traverse(&mut scene, world).unwrap();
    let list = cx.into_draw_list();
    group.bench_function("draw_recorded", |b| {
        b.iter_batched(
            Recorder::new,
            |mut recorder| {
                DrawContext::new(view, &mut recorder)
                    .draw(&scene, &list)
                    .unwrap();
                black_box(recorder.draw_calls());
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("pick_center", |b| {
        b.iter(|| {
            let mut px = PickContext::new(view, Point::new(256.0, 256.0));
            px.pick(&mut scene, world).unwrap();
            black_box(px.closest().map(|hit| hit.pixel_z));
        });
    });
    group.finish();
}

criterion_group!(benches, bench_mesh_build, bench_traversals);
criterion_main!(benches);
