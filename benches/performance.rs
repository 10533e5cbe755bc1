// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use viewmetrics::metrics::{
    color_fidelity, extract_silhouette, generate_heatmap, normal_fidelity, HeatmapSource,
    SilhouetteThresholds,
};
use viewmetrics::{ColorBuffer, DepthBuffer, NormalBuffer, ViewSampler};

const SIZES: [u32; 3] = [256, 512, 1024];

fn gradient_color(size: u32, offset: u8) -> ColorBuffer {
    let mut buffer = ColorBuffer::new(size, size, 3);
    for y in 0..size {
        for x in 0..size {
            let v = ((x + y) % 256) as u8;
            buffer.set(x, y, &[v, v.wrapping_add(offset), 255 - v]);
        }
    }
    buffer
}

/// Sphere-like depth with matching normals
fn sphere_buffers(size: u32) -> (DepthBuffer, NormalBuffer) {
    let mut depth = DepthBuffer::filled(size, size, 1, 1.0);
    let mut normal = NormalBuffer::new(size, size, 3);
    let half = size as f32 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 - half) / half;
            let dy = (y as f32 - half) / half;
            let r2 = dx * dx + dy * dy;
            if r2 < 0.8 {
                let dz = (1.0 - r2).sqrt();
                depth.set(x, y, &[0.5 - dz * 0.1]);
                normal.set(x, y, &[dx * 0.5 + 0.5, dy * 0.5 + 0.5, dz * 0.5 + 0.5]);
            }
        }
    }
    (depth, normal)
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("metrics");

    for size in SIZES {
        let a = gradient_color(size, 0);
        let b = gradient_color(size, 7);
        group.bench_with_input(BenchmarkId::new("color_fidelity", size), &size, |bench, _| {
            bench.iter(|| color_fidelity(black_box(&a), black_box(&b)).unwrap());
        });

        let (_, na) = sphere_buffers(size);
        let nb = na.clone();
        group.bench_with_input(BenchmarkId::new("normal_fidelity", size), &size, |bench, _| {
            bench.iter(|| normal_fidelity(black_box(&na), black_box(&nb)).unwrap());
        });
    }

    group.finish();
}

fn bench_silhouette(c: &mut Criterion) {
    let mut group = c.benchmark_group("silhouette");
    let thresholds = SilhouetteThresholds::default();

    for size in SIZES {
        let (depth, normal) = sphere_buffers(size);
        group.bench_with_input(BenchmarkId::new("extract", size), &size, |bench, _| {
            bench.iter(|| {
                extract_silhouette(black_box(&depth), black_box(&normal), thresholds).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_heatmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("heatmap");

    for size in SIZES {
        let a = gradient_color(size, 0);
        let b = gradient_color(size, 40);
        group.bench_with_input(BenchmarkId::new("color", size), &size, |bench, _| {
            bench.iter(|| {
                generate_heatmap(HeatmapSource::Color {
                    reference: black_box(&a),
                    candidate: black_box(&b),
                })
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_sampling(c: &mut Criterion) {
    c.bench_function("sample_64_views", |b| {
        let sampler = ViewSampler::new(64, 2.0, 1.0);
        b.iter(|| black_box(sampler.generate_regular()));
    });
}

criterion_group!(
    benches,
    bench_metrics,
    bench_silhouette,
    bench_heatmap,
    bench_sampling
);
criterion_main!(benches);
