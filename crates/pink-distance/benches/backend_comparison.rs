// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pink_distance::backend::{ComputeBackend, CpuBackend};
use pink_types::AccumulatorKind;

fn bench_cpu_f32(c: &mut Criterion) {
    let neuron_dim = 64;
    let neuron_size = neuron_dim * neuron_dim;
    let n_neurons = 100;
    let n_variants = 8;

    let neurons: Vec<f32> = (0..n_neurons * neuron_size)
        .map(|i| (i % 255) as f32)
        .collect();
    let variants: Vec<f32> = (0..n_variants * neuron_size)
        .map(|i| ((i * 7) % 255) as f32)
        .collect();

    let backend = CpuBackend::new();

    c.bench_function("cpu_distance_matrix_f32_64x64x100x8", |b| {
        b.iter(|| {
            black_box(
                backend
                    .compute_distances(
                        &neurons,
                        n_neurons,
                        &variants,
                        n_variants,
                        neuron_dim,
                        neuron_dim,
                        AccumulatorKind::Float,
                    )
                    .unwrap(),
            )
        })
    });
}

fn bench_cpu_u8_packed(c: &mut Criterion) {
    let neuron_dim = 64;
    let neuron_size = neuron_dim * neuron_dim;
    let n_neurons = 100;
    let n_variants = 8;

    let neurons: Vec<u8> = (0..n_neurons * neuron_size).map(|i| (i % 255) as u8).collect();
    let variants: Vec<u8> = (0..n_variants * neuron_size)
        .map(|i| ((i * 7) % 255) as u8)
        .collect();

    let backend = CpuBackend::new();

    c.bench_function("cpu_distance_matrix_u8_packed_64x64x100x8", |b| {
        b.iter(|| {
            black_box(
                backend
                    .compute_distances(
                        &neurons,
                        n_neurons,
                        &variants,
                        n_variants,
                        neuron_dim,
                        neuron_dim,
                        AccumulatorKind::Uint8,
                    )
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_cpu_f32, bench_cpu_u8_packed);
criterion_main!(benches);
