// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use arbor_index::{BoundingBoxTree, partial_index_sort};
use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f32(&mut self) -> f32 {
        let v = self.next_u64() >> 40;
        (v as f32) / ((1u64 << 24) as f32)
    }
}

fn gen_random_points(count: usize, extent: f32) -> Vec<f32> {
    let mut rng = Rng::new(0xCAFE_F00D_DEAD_BEEF);
    (0..3 * count).map(|_| rng.next_f32() * extent).collect()
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<f32> {
    let mut rng = Rng::new(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(3 * n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let center = [
            rng.next_f32() * 1000.0,
            rng.next_f32() * 1000.0,
            rng.next_f32() * 1000.0,
        ];
        for _ in 0..per_cluster {
            for c in center {
                out.push(c + (rng.next_f32() - 0.5) * spread);
            }
        }
    }
    out
}

/// Points on a flat sheet, the shape of a height field's cell centers.
fn gen_sheet_points(n: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(3 * n * n);
    for y in 0..n {
        for x in 0..n {
            out.extend_from_slice(&[x as f32, y as f32, 0.0]);
        }
    }
    out
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bbox_tree_build");
    for &count in &[10_000usize, 100_000] {
        let xyz = gen_random_points(count, 1000.0);
        group.throughput(Throughput::Elements(count as u64));
        for &min_size in &[16usize, 1024] {
            group.bench_function(format!("random_n{count}_min{min_size}"), |b| {
                b.iter(|| {
                    let tree = BoundingBoxTree::new(min_size, black_box(&xyz)).unwrap();
                    black_box(tree.node_count());
                });
            });
        }
    }
    let xyz = gen_clustered_points(64, 1024, 20.0);
    group.throughput(Throughput::Elements((64 * 1024) as u64));
    group.bench_function("clustered_64x1024_min1024", |b| {
        b.iter(|| {
            let tree = BoundingBoxTree::new(1024, black_box(&xyz)).unwrap();
            black_box(tree.depth());
        });
    });
    let xyz = gen_sheet_points(256);
    group.throughput(Throughput::Elements((256 * 256) as u64));
    group.bench_function("sheet_256x256_min1024", |b| {
        b.iter(|| {
            let tree = BoundingBoxTree::new(1024, black_box(&xyz)).unwrap();
            black_box(tree.leaves().count());
        });
    });
    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("partial_index_sort");
    for &count in &[1_000usize, 100_000] {
        let keys: Vec<f32> = gen_random_points(count, 1.0)
            .into_iter()
            .take(count)
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("median_n{count}"), |b| {
            b.iter_batched(
                || (0..count).collect::<Vec<usize>>(),
                |mut indices| {
                    partial_index_sort(count / 2, &keys, &mut indices);
                    black_box(indices[count / 2]);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_select);
criterion_main!(benches);
