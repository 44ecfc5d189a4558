// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types shared by every crate in the PINK workspace: the error
//! hierarchy, the pixel `Element` trait, and the small configuration enums
//! (layout kind, interpolation, accumulator precision, distribution
//! function) that flow from the CLI down into the algorithmic core.

use std::fmt;

/// Errors raised anywhere in the PINK workspace.
///
/// All variants are fatal at the Trainer/Mapper facade boundary (see
/// `pink-som`): construction errors and per-image I/O errors both abort the
/// run. There is no retry layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    StdIo(#[from] std::io::Error),

    #[error("numeric overflow in accumulator: {0}")]
    NumericOverflow(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// SOM lattice topology kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Cartesian,
    Hexagonal,
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutKind::Cartesian => write!(f, "cartesian"),
            LayoutKind::Hexagonal => write!(f, "hexagonal"),
        }
    }
}

/// Pixel-sampling strategy used by the transform generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    NearestNeighbor,
    Bilinear,
}

/// Accumulator precision used by the distance engine's core reduction.
///
/// `Float` is valid for any element type. `Uint16`/`Uint8` are optimizations
/// for `u8` element types; requesting them for `f32` images silently widens
/// back to `Float` (logged at `tracing::debug!` by the distance engine,
/// since ranking equivalence — not raw accumulator type — is the invariant
/// that actually matters).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorKind {
    Float,
    Uint16,
    Uint8,
}

/// Radial weighting function shape for the distribution kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistFunc {
    Gaussian,
    MexicanHat,
}

/// Compute backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    #[cfg(feature = "gpu")]
    Wgpu,
    Auto,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Auto
    }
}

/// Intermediate-SOM storage mode between training images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntermediateStorage {
    Off,
    Overwrite,
    Keep,
}

/// A pixel sample type usable in an image, variant, or neuron prototype.
///
/// Implemented for `f32` and `u8`, the element types produced by the
/// image-stream reader. Conversions are explicit and saturating/clamping
/// rather than panicking, matching the teacher's preference for
/// fallible-but-total numeric conversions over `as` truncation in hot loops.
pub trait Element: Copy + Send + Sync + PartialEq + fmt::Debug + 'static {
    const ZERO: Self;

    fn to_f32(self) -> f32;
    fn from_f32(v: f32) -> Self;

    /// Elementwise `self + weight * (target - self)`, the neuron update
    /// applied by the Updater. Performed in `f32` regardless of `Self` and
    /// converted back, so integer prototypes accumulate the same rounding
    /// behavior as the original C++ (truncating cast back to the integer
    /// element type).
    fn weighted_move(self, target: Self, weight: f32) -> Self {
        let new = self.to_f32() + weight * (target.to_f32() - self.to_f32());
        Self::from_f32(new)
    }
}

impl Element for f32 {
    const ZERO: f32 = 0.0;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(v: f32) -> Self {
        v
    }
}

impl Element for u8 {
    const ZERO: u8 = 0;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn from_f32(v: f32) -> Self {
        v.round().clamp(0.0, u8::MAX as f32) as u8
    }
}

/// Wide integer element type, kept for compatibility with the upstream
/// regression fixture that exercises a saturating-cast edge case on a
/// near-`i32::MAX` pixel value (see `pink-som`'s `trainer_cartesian_2d_int`
/// test, grounded in `examples/original_source/test/SelfOrganizingMapTest/Trainer.cpp`).
/// Not produced by the image-stream reader, which only emits `f32`/`u8`
/// samples per the data model (§3).
impl Element for i32 {
    const ZERO: i32 = 0;

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn from_f32(v: f32) -> Self {
        // Rust's float-to-int `as` cast saturates at the target's bounds
        // rather than wrapping, matching the "saturating integer input"
        // behavior the fixture is named for.
        v as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_move_f32_reaches_target_at_weight_one() {
        let moved = 2.0f32.weighted_move(10.0, 1.0);
        assert_eq!(moved, 10.0);
    }

    #[test]
    fn weighted_move_u8_clamps() {
        let moved = 250u8.weighted_move(255, 1.0);
        assert_eq!(moved, 255);
    }

    #[test]
    fn weighted_move_zero_weight_is_identity() {
        assert_eq!(5u8.weighted_move(200, 0.0), 5);
    }
}
