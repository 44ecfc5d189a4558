// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! `pink` — the command-line entry point. Parses flags with `clap`'s
//! derive API, validates the configuration before touching any file or
//! constructing the facade, then drives either a training or a mapping
//! run to completion. All library crates return `pink_types::Result<T>`;
//! this binary is the only place that wraps errors in `anyhow::Context`
//! for a one-line diagnostic on stderr before exiting.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use pink_io::{resolve_progress_every, InitSpec, MapResultWriter};
use pink_kernel::Kernel;
use pink_som::{FacadeConfig, InitMode, Lattice, TrainerMapper};
use pink_types::{AccumulatorKind, BackendKind, DistFunc, Interpolation, LayoutKind};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLayout {
    Cartesian,
    Hexagonal,
}

impl From<CliLayout> for LayoutKind {
    fn from(v: CliLayout) -> Self {
        match v {
            CliLayout::Cartesian => LayoutKind::Cartesian,
            CliLayout::Hexagonal => LayoutKind::Hexagonal,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDistType {
    Float,
    Uint16,
    Uint8,
}

impl From<CliDistType> for AccumulatorKind {
    fn from(v: CliDistType) -> Self {
        match v {
            CliDistType::Float => AccumulatorKind::Float,
            CliDistType::Uint16 => AccumulatorKind::Uint16,
            CliDistType::Uint8 => AccumulatorKind::Uint8,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliInterpolation {
    #[value(name = "nearest_neighbor")]
    NearestNeighbor,
    Bilinear,
}

impl From<CliInterpolation> for Interpolation {
    fn from(v: CliInterpolation) -> Self {
        match v {
            CliInterpolation::NearestNeighbor => Interpolation::NearestNeighbor,
            CliInterpolation::Bilinear => Interpolation::Bilinear,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliInterStore {
    Off,
    Overwrite,
    Keep,
}

/// Rotation- and flip-invariant Self-Organizing Maps trained over 2D images.
#[derive(Parser, Debug)]
#[command(name = "pink", version, author, long_about = None)]
struct Args {
    /// Train a SOM: reads images from DATA_FILE, writes the trained SOM to RESULT_FILE.
    #[arg(long, num_args = 2, value_names = ["DATA_FILE", "RESULT_FILE"])]
    train: Option<Vec<PathBuf>>,

    /// Map images against an existing SOM: reads DATA_FILE and SOM_FILE, writes distances to RESULT_FILE.
    #[arg(long, num_args = 3, value_names = ["DATA_FILE", "RESULT_FILE", "SOM_FILE"])]
    map: Option<Vec<PathBuf>>,

    #[arg(long, default_value = "cartesian")]
    layout: CliLayout,

    #[arg(long, default_value_t = 2)]
    som_width: u32,
    #[arg(long, default_value_t = 1)]
    som_height: u32,
    #[arg(long, default_value_t = 1)]
    som_depth: u32,
    #[arg(long, default_value_t = false)]
    pbc: bool,

    /// Neuron side length; defaults to `ceil(image_dim * sqrt(2)/2)`.
    #[arg(long)]
    neuron_dimension: Option<u32>,
    /// Crop window for the distance reduction; defaults per SPEC_FULL §9's
    /// resolved open question (derived from the input's spatial extent).
    #[arg(long)]
    euclidean_distance_dimension: Option<u32>,
    #[arg(long, default_value = "float")]
    euclidean_distance_type: CliDistType,

    #[arg(long, default_value_t = 360)]
    numrot: u32,
    #[arg(long, default_value_t = false)]
    flip_off: bool,
    #[arg(long, default_value = "bilinear")]
    interpolation: CliInterpolation,

    #[arg(long, default_value_t = 1)]
    num_iter: u32,
    /// "zero", "random", "random_with_preferred_direction", or a path to an
    /// existing SOM file.
    #[arg(long, default_value = "zero")]
    init: String,
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, num_args = 3, value_names = ["SHAPE", "SIGMA", "DAMPING"])]
    dist_func: Option<Vec<String>>,
    #[arg(long)]
    max_update_distance: Option<f32>,

    #[arg(long, default_value_t = false)]
    cuda_off: bool,
    #[arg(long)]
    numthreads: Option<usize>,
    #[arg(long)]
    b1: Option<u32>,

    #[arg(long, default_value = "off")]
    inter_store: CliInterStore,
    #[arg(long)]
    store_rot_flip: Option<PathBuf>,
    #[arg(long)]
    progress: Option<u64>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    // An explicit RUST_LOG always wins; otherwise -v/-vv/-vvv escalate
    // verbosity, matching the teacher's `resolve_env_filter` precedence.
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("pink={level},pink_som={level},pink_distance={level}"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn resolve_init(init: &str, seed: u64) -> InitSpec {
    match init {
        "zero" => InitSpec::Synthetic(InitMode::Zero),
        "random" => InitSpec::Synthetic(InitMode::Random { seed }),
        "random_with_preferred_direction" => {
            InitSpec::Synthetic(InitMode::RandomPreferredDirection { seed })
        }
        path => InitSpec::FromFile(PathBuf::from(path)),
    }
}

fn resolve_neuron_dim(explicit: Option<u32>, image_dim: u32) -> u32 {
    explicit.unwrap_or_else(|| {
        ((image_dim as f32) * std::f32::consts::SQRT_2 / 2.0).ceil() as u32
    })
}

fn resolve_euclidean_distance_dim(explicit: Option<u32>, image_dim: u32, neuron_dim: u32) -> u32 {
    let default = ((image_dim as f32) * std::f32::consts::SQRT_2 / 2.0).ceil() as u32;
    explicit.unwrap_or(default).min(neuron_dim).max(1)
}

fn resolve_backend(cuda_off: bool) -> BackendKind {
    if cuda_off {
        BackendKind::Cpu
    } else {
        BackendKind::Auto
    }
}

fn resolve_dist_func(raw: &Option<Vec<String>>) -> Result<Kernel> {
    match raw {
        None => Ok(Kernel::new(DistFunc::Gaussian, 1.0, 0.2)),
        Some(parts) => {
            let shape = match parts[0].as_str() {
                "gaussian" => DistFunc::Gaussian,
                "mexicanhat" => DistFunc::MexicanHat,
                other => bail!("unknown --dist-func shape '{other}', expected gaussian or mexicanhat"),
            };
            let sigma: f32 = parts[1]
                .parse()
                .with_context(|| format!("invalid sigma '{}'", parts[1]))?;
            let damping: f32 = parts[2]
                .parse()
                .with_context(|| format!("invalid damping '{}'", parts[2]))?;
            Ok(Kernel::new(shape, sigma, damping))
        }
    }
}

fn run(args: Args) -> Result<()> {
    if let Some(b1) = args.b1 {
        // The GPU backend's compute shader uses a fixed workgroup size; --b1
        // is accepted for command-line compatibility but isn't wired to it yet.
        tracing::debug!(b1, "--b1 accepted but the wgpu backend's workgroup size is fixed");
    }

    if args.numthreads.is_some() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(args.numthreads.unwrap())
            .build_global();
        // `build_global` fails if already initialized elsewhere in-process;
        // this binary only calls it once so a failure here is unexpected
        // but not fatal to the run.
        if let Err(e) = pool {
            tracing::debug!(error = %e, "rayon global pool already initialized");
        }
    }

    match (args.train.clone(), args.map.clone()) {
        (Some(_), Some(_)) => bail!("--train and --map are mutually exclusive"),
        (None, None) => bail!("one of --train or --map is required"),
        (Some(train_args), None) => run_train(args, train_args),
        (None, Some(map_args)) => run_map(args, map_args),
    }
}

fn run_train(args: Args, train_args: Vec<PathBuf>) -> Result<()> {
    let data_file = &train_args[0];
    let result_file = &train_args[1];

    let mut stream = pink_io::ImageStream::open(data_file).context("opening data file")?;
    let image_dim = stream.spatial_dim();
    let num_images = stream.num_entries();

    let neuron_dim = resolve_neuron_dim(args.neuron_dimension, image_dim);
    let euclidean_distance_dim =
        resolve_euclidean_distance_dim(args.euclidean_distance_dimension, image_dim, neuron_dim);

    let lattice = Lattice::new(
        args.layout.into(),
        args.som_width,
        args.som_height,
        args.som_depth,
        args.pbc,
    )
    .context("constructing SOM lattice")?;

    let init = resolve_init(&args.init, args.seed);
    let som = pink_io::build_som::<f32>(init, lattice, neuron_dim as usize)
        .context("initializing SOM")?;

    let kernel = resolve_dist_func(&args.dist_func)?;
    let progress_every = resolve_progress_every(args.progress, num_images as u64 * args.num_iter as u64);

    let config = FacadeConfig {
        num_rot: args.numrot,
        flip: !args.flip_off,
        max_update_distance: args.max_update_distance,
        interpolation: args.interpolation.into(),
        backend: resolve_backend(args.cuda_off),
        accumulator: args.euclidean_distance_type.into(),
        euclidean_distance_dim: euclidean_distance_dim as usize,
        progress_every,
    };

    let mut trainer =
        TrainerMapper::new(som, kernel, config).context("constructing trainer")?;

    for iteration in 0..args.num_iter {
        if iteration > 0 {
            stream = pink_io::ImageStream::open(data_file).context("reopening data file")?;
        }
        for image in stream {
            let image = image.context("reading training image")?;
            trainer
                .train_step(&image.pixels, image.spatial_dim as usize)
                .context("training step")?;
        }

        match args.inter_store {
            CliInterStore::Off => {}
            CliInterStore::Overwrite => {
                pink_io::write_som(trainer.som(), result_file)
                    .context("writing intermediate SOM (overwrite)")?;
            }
            CliInterStore::Keep => {
                let path = result_file.with_extension(format!("iter{iteration}.som"));
                pink_io::write_som(trainer.som(), &path)
                    .context("writing intermediate SOM (keep)")?;
            }
        }
    }

    pink_io::write_som(trainer.som(), result_file).context("writing final SOM")?;
    Ok(())
}

fn run_map(args: Args, map_args: Vec<PathBuf>) -> Result<()> {
    let data_file = &map_args[0];
    let result_file = &map_args[1];
    let som_file = &map_args[2];

    let stream = pink_io::ImageStream::open(data_file).context("opening data file")?;
    let image_dim = stream.spatial_dim();
    let num_images = stream.num_entries();

    let som: pink_som::Som<f32> = pink_io::read_som(som_file).context("reading SOM file")?;
    let neuron_dim = som.neuron_dim() as u32;
    let euclidean_distance_dim =
        resolve_euclidean_distance_dim(args.euclidean_distance_dimension, image_dim, neuron_dim);

    let kernel = resolve_dist_func(&args.dist_func)?;
    let progress_every = resolve_progress_every(args.progress, num_images as u64);

    let config = FacadeConfig {
        num_rot: args.numrot,
        flip: !args.flip_off,
        max_update_distance: args.max_update_distance,
        interpolation: args.interpolation.into(),
        backend: resolve_backend(args.cuda_off),
        accumulator: args.euclidean_distance_type.into(),
        euclidean_distance_dim: euclidean_distance_dim as usize,
        progress_every,
    };

    let som_size = som.size();
    let mut mapper = TrainerMapper::new(som, kernel, config).context("constructing mapper")?;

    let mut writer = MapResultWriter::create(
        result_file,
        args.store_rot_flip.as_ref(),
        num_images,
        som_size,
        args.numrot,
    )
    .context("creating map result file")?;

    for image in stream {
        let image = image.context("reading mapping image")?;
        let outcome = mapper
            .map_step(&image.pixels, image.spatial_dim as usize)
            .context("mapping step")?;
        writer
            .write_step(&outcome.distances, &outcome.best_variant)
            .context("writing map result")?;
    }

    writer.finish().context("finalizing map result file")
}
