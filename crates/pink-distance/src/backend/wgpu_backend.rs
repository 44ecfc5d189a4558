// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! GPU backend via wgpu. Always accumulates in `f32` regardless of the
//! requested [`pink_types::AccumulatorKind`] — the packed-integer and
//! overflow-checked accumulators exist to shrink CPU memory traffic, which
//! is not the GPU's bottleneck.
//!
//! One compute invocation handles one `(neuron, variant)` pair and emits
//! its summed squared distance into a 2D matrix; the per-neuron
//! reduction across variants (argmin) runs on the host after read-back,
//! since the matrix is already resident there for the Updater's use.

use super::{ComputeBackend, DistanceResult};
use pink_types::{AccumulatorKind, Element, Error, Result};
use wgpu::util::DeviceExt;

const SHADER_SOURCE: &str = r#"
struct Params {
    n_neurons: u32,
    n_variants: u32,
    neuron_dim: u32,
    crop_dim: u32,
    crop_offset: u32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read> neurons: array<f32>;
@group(0) @binding(2) var<storage, read> variants: array<f32>;
@group(0) @binding(3) var<storage, read_write> out_matrix: array<f32>;

@compute @workgroup_size(64)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let idx = gid.x;
    let total = params.n_neurons * params.n_variants;
    if (idx >= total) {
        return;
    }

    let neuron_idx = idx / params.n_variants;
    let variant_idx = idx % params.n_variants;

    let neuron_size = params.neuron_dim * params.neuron_dim;
    let neuron_base = neuron_idx * neuron_size;
    let variant_base = variant_idx * neuron_size;

    var acc: f32 = 0.0;
    for (var y: u32 = 0u; y < params.crop_dim; y = y + 1u) {
        let row = (y + params.crop_offset) * params.neuron_dim;
        for (var x: u32 = 0u; x < params.crop_dim; x = x + 1u) {
            let pix = row + x + params.crop_offset;
            let d = neurons[neuron_base + pix] - variants[variant_base + pix];
            acc = acc + d * d;
        }
    }

    out_matrix[neuron_idx * params.n_variants + variant_idx] = acc;
}
"#;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
    n_neurons: u32,
    n_variants: u32,
    neuron_dim: u32,
    crop_dim: u32,
    crop_offset: u32,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl WgpuBackend {
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| Error::BackendUnavailable("no WGPU adapter found".to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pink-distance device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .map_err(|e| Error::BackendUnavailable(format!("failed to acquire WGPU device: {e}")))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("distance_matrix"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("distance_matrix_layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("distance_matrix_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("distance_matrix_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
        });

        Ok(WgpuBackend {
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }

    fn run<T: Element>(
        &self,
        neurons: &[T],
        n_neurons: usize,
        variants: &[T],
        n_variants: usize,
        neuron_dim: usize,
        euclidean_distance_dim: usize,
    ) -> Result<DistanceResult> {
        let neurons_f32: Vec<f32> = neurons.iter().map(|&v| v.to_f32()).collect();
        let variants_f32: Vec<f32> = variants.iter().map(|&v| v.to_f32()).collect();

        let crop_offset = ((neuron_dim - euclidean_distance_dim) / 2) as u32;
        let params = Params {
            n_neurons: n_neurons as u32,
            n_variants: n_variants as u32,
            neuron_dim: neuron_dim as u32,
            crop_dim: euclidean_distance_dim as u32,
            crop_offset,
        };

        let params_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let neurons_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("neurons"),
                contents: bytemuck::cast_slice(&neurons_f32),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let variants_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("variants"),
                contents: bytemuck::cast_slice(&variants_f32),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let matrix_len = (n_neurons * n_variants) as u64 * std::mem::size_of::<f32>() as u64;
        let matrix_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("distance_matrix"),
            size: matrix_len,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("distance_matrix_readback"),
            size: matrix_len,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("distance_matrix_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: neurons_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: variants_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: matrix_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("distance_matrix_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("distance_matrix_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let total = (n_neurons * n_variants) as u32;
            let workgroups = total.div_ceil(64).max(1);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&matrix_buf, 0, &readback_buf, 0, matrix_len);
        self.queue.submit(Some(encoder.finish()));

        let slice = readback_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| Error::BackendUnavailable("WGPU map_async channel closed".to_string()))?
            .map_err(|e| Error::BackendUnavailable(format!("WGPU buffer map failed: {e}")))?;

        let matrix: Vec<f32> = bytemuck::cast_slice(&slice.get_mapped_range()).to_vec();
        readback_buf.unmap();

        let mut distances = Vec::with_capacity(n_neurons);
        let mut best_variant = Vec::with_capacity(n_neurons);
        for n in 0..n_neurons {
            let row = &matrix[n * n_variants..(n + 1) * n_variants];
            let mut best = 0usize;
            for v in 1..n_variants {
                if row[v] < row[best] {
                    best = v;
                }
            }
            distances.push(row[best]);
            best_variant.push(best);
        }

        Ok(DistanceResult {
            distances,
            best_variant,
        })
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    let ty = if binding == 0 {
        wgpu::BufferBindingType::Uniform
    } else {
        wgpu::BufferBindingType::Storage { read_only }
    };
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl<T: Element> ComputeBackend<T> for WgpuBackend {
    fn backend_name(&self) -> &str {
        "wgpu"
    }

    fn compute_distances(
        &self,
        neurons: &[T],
        n_neurons: usize,
        variants: &[T],
        n_variants: usize,
        neuron_dim: usize,
        euclidean_distance_dim: usize,
        accumulator: AccumulatorKind,
    ) -> Result<DistanceResult> {
        if !matches!(accumulator, AccumulatorKind::Float) {
            tracing::debug!(
                requested = ?accumulator,
                "WGPU backend always accumulates in float, ignoring requested accumulator"
            );
        }
        self.run(
            neurons,
            n_neurons,
            variants,
            n_variants,
            neuron_dim,
            euclidean_distance_dim,
        )
    }
}
