// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The Trainer/Mapper facade: the one entry point that wires the transform
//! generator, distance engine, and updater together around a SOM.

use crate::som::Som;
use crate::updater;
use pink_distance::backend::{create_backend, ComputeBackend};
use pink_kernel::Kernel;
use pink_transform::{generate_variant_stack, validate_num_rot};
use pink_types::{AccumulatorKind, BackendKind, Element, Error, Interpolation, Result};

/// Outcome of one training step, kept for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct TrainStepOutcome {
    pub winner: usize,
    pub best_variant: usize,
}

/// Outcome of one mapping step: the full per-neuron distance and
/// best-rotation matrices, nothing is mutated.
#[derive(Debug, Clone)]
pub struct MapStepOutcome {
    pub distances: Vec<f32>,
    pub best_variant: Vec<usize>,
}

/// Configuration shared by training and mapping runs.
pub struct FacadeConfig {
    pub num_rot: u32,
    pub flip: bool,
    pub max_update_distance: Option<f32>,
    pub interpolation: Interpolation,
    pub backend: BackendKind,
    pub accumulator: AccumulatorKind,
    /// Crop window for the distance reduction (§4.4). The upstream source
    /// re-derives this independently at CLI-parse time and at trainer
    /// construction, with two different defaults (`data_dim·√2/2` vs.
    /// `neuron_dim·√2/2`) that can silently disagree; this crate resolves it
    /// exactly once, at the caller's construction site, and requires the
    /// already-resolved value here rather than inventing a second default.
    pub euclidean_distance_dim: usize,
    pub progress_every: Option<u64>,
}

/// Drives a SOM through repeated `TRAIN_STEP`s or `MAP_STEP`s over an
/// image stream. Constructed once per run.
pub struct TrainerMapper<T: Element> {
    som: Som<T>,
    kernel: Kernel,
    num_rot: u32,
    flip: bool,
    max_update_distance: Option<f32>,
    interpolation: Interpolation,
    euclidean_distance_dim: usize,
    accumulator: AccumulatorKind,
    backend: Box<dyn ComputeBackend<T>>,
    progress_every: Option<u64>,
    images_processed: u64,
}

impl<T: Element> TrainerMapper<T>
where
    pink_distance::backend::CpuBackend: ComputeBackend<T>,
{
    pub fn new(som: Som<T>, kernel: Kernel, config: FacadeConfig) -> Result<Self> {
        validate_num_rot(config.num_rot)?;
        if let Some(d) = config.max_update_distance {
            if d < 0.0 {
                return Err(Error::Configuration(format!(
                    "max_update_distance must be non-negative, got {d}"
                )));
            }
        }

        let neuron_dim = som.neuron_dim();
        let euclidean_distance_dim = config.euclidean_distance_dim;
        if euclidean_distance_dim == 0 {
            return Err(Error::Configuration(
                "euclidean_distance_dim must be at least 1".to_string(),
            ));
        }
        if euclidean_distance_dim > neuron_dim {
            return Err(Error::Configuration(format!(
                "euclidean_distance_dim ({euclidean_distance_dim}) cannot exceed neuron_dim ({neuron_dim})"
            )));
        }

        let backend = create_backend::<T>(config.backend)?;

        Ok(TrainerMapper {
            som,
            kernel,
            num_rot: config.num_rot,
            flip: config.flip,
            max_update_distance: config.max_update_distance,
            interpolation: config.interpolation,
            euclidean_distance_dim,
            accumulator: config.accumulator,
            backend,
            progress_every: config.progress_every,
            images_processed: 0,
        })
    }

    pub fn som(&self) -> &Som<T> {
        &self.som
    }

    pub fn into_som(self) -> Som<T> {
        self.som
    }

    fn variant_stack(&self, image: &[T], image_dim: usize) -> Result<Vec<T>> {
        generate_variant_stack(
            image,
            image_dim,
            self.som.neuron_dim(),
            self.num_rot,
            self.flip,
            self.interpolation,
        )
    }

    fn report_progress(&mut self) {
        self.images_processed += 1;
        if let Some(every) = self.progress_every {
            if every > 0 && self.images_processed % every == 0 {
                tracing::info!(images_processed = self.images_processed, "training progress");
            }
        }
    }

    /// Runs one training step: transform, distance, argmin, weighted update.
    #[tracing::instrument(skip(self, image), fields(neuron_count = self.som.size()))]
    pub fn train_step(&mut self, image: &[T], image_dim: usize) -> Result<TrainStepOutcome> {
        let neuron_size = self.som.neuron_size();
        let stack = self.variant_stack(image, image_dim)?;
        let n_variants = stack.len() / neuron_size;

        let result = self.backend.compute_distances(
            self.som.buffer(),
            self.som.size(),
            &stack,
            n_variants,
            self.som.neuron_dim(),
            self.euclidean_distance_dim,
            self.accumulator,
        )?;

        let winner = result.best_matching_neuron();
        let best_variant = result.best_variant[winner];
        let target = &stack[best_variant * neuron_size..(best_variant + 1) * neuron_size];

        tracing::debug!(winner, best_variant, distance = result.distances[winner], "training step");

        updater::apply_update(
            &mut self.som,
            winner,
            target,
            &self.kernel,
            self.max_update_distance,
        );

        self.report_progress();

        Ok(TrainStepOutcome {
            winner,
            best_variant,
        })
    }

    /// Runs one mapping step: transform, distance, full matrices returned,
    /// no mutation.
    #[tracing::instrument(skip(self, image), fields(neuron_count = self.som.size()))]
    pub fn map_step(&mut self, image: &[T], image_dim: usize) -> Result<MapStepOutcome> {
        let neuron_size = self.som.neuron_size();
        let stack = self.variant_stack(image, image_dim)?;
        let n_variants = stack.len() / neuron_size;

        let result = self.backend.compute_distances(
            self.som.buffer(),
            self.som.size(),
            &stack,
            n_variants,
            self.som.neuron_dim(),
            self.euclidean_distance_dim,
            self.accumulator,
        )?;

        self.report_progress();

        Ok(MapStepOutcome {
            distances: result.distances,
            best_variant: result.best_variant,
        })
    }
}
