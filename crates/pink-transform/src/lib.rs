// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Rotation/flip variant generation.
//!
//! Produces the contiguous stack of `N_t` neuron-sized variants of a source
//! image that the distance engine compares each neuron against. Resampling
//! is the expensive part, so only `N_rot / 4` angles are ever actually
//! resampled; the remaining three quarter-turns per angle come from an
//! in-place 90-degree shuffle of the resampled buffer.

use pink_types::{Element, Error, Interpolation, Result};

/// Validates that `n_rot` is either 1 (no rotation search) or a positive
/// multiple of 4 (one resample per quarter-turn family).
pub fn validate_num_rot(n_rot: u32) -> Result<()> {
    if n_rot == 1 || (n_rot > 0 && n_rot % 4 == 0) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "num_rot must be 1 or a positive multiple of 4, got {n_rot}"
        )))
    }
}

/// Resamples `src` (an `image_dim x image_dim` row-major array) into a
/// `neuron_dim x neuron_dim` row-major array rotated by `alpha` radians
/// about its center.
///
/// `alpha = 0.0` is a centered crop: with bilinear interpolation this is
/// exact (no fractional sampling), matching the identity-crop the transform
/// generator always emits first.
pub fn resample<T: Element>(
    src: &[T],
    image_dim: usize,
    neuron_dim: usize,
    alpha: f32,
    interpolation: Interpolation,
) -> Vec<T> {
    match interpolation {
        Interpolation::Bilinear => resample_bilinear(src, image_dim, neuron_dim, alpha),
        Interpolation::NearestNeighbor => resample_nearest(src, image_dim, neuron_dim, alpha),
    }
}

fn resample_bilinear<T: Element>(
    src: &[T],
    src_dim: usize,
    dst_dim: usize,
    alpha: f32,
) -> Vec<T> {
    let cos_a = alpha.cos();
    let sin_a = alpha.sin();

    let src_center = (src_dim as f32 - 1.0) * 0.5;
    let dst_center = (dst_dim as f32 - 1.0) * 0.5;

    let mut dst = vec![T::ZERO; dst_dim * dst_dim];

    for dy in 0..dst_dim {
        for dx in 0..dst_dim {
            let px = dx as f32 - dst_center;
            let py = dy as f32 - dst_center;

            let sx = px * cos_a - py * sin_a + src_center;
            let sy = px * sin_a + py * cos_a + src_center;

            let out = if sx < 0.0 || sx > src_dim as f32 - 1.0 || sy < 0.0 || sy > src_dim as f32 - 1.0
            {
                T::ZERO
            } else {
                let x0 = sx as usize;
                let y0 = sy as usize;
                let x1 = (x0 + 1).min(src_dim - 1);
                let y1 = (y0 + 1).min(src_dim - 1);

                let rx = sx - x0 as f32;
                let ry = sy - y0 as f32;
                let cx = 1.0 - rx;
                let cy = 1.0 - ry;

                let v00 = src[y0 * src_dim + x0].to_f32();
                let v01 = src[y1 * src_dim + x0].to_f32();
                let v10 = src[y0 * src_dim + x1].to_f32();
                let v11 = src[y1 * src_dim + x1].to_f32();

                T::from_f32(cx * cy * v00 + cx * ry * v01 + rx * cy * v10 + rx * ry * v11)
            };

            dst[dy * dst_dim + dx] = out;
        }
    }

    dst
}

fn resample_nearest<T: Element>(
    src: &[T],
    src_dim: usize,
    dst_dim: usize,
    alpha: f32,
) -> Vec<T> {
    let cos_a = alpha.cos();
    let sin_a = alpha.sin();

    let src_center = (src_dim as f32 - 1.0) * 0.5;
    let dst_center = (dst_dim as f32 - 1.0) * 0.5;

    let mut dst = vec![T::ZERO; dst_dim * dst_dim];

    for dy in 0..dst_dim {
        for dx in 0..dst_dim {
            let px = dx as f32 - dst_center;
            let py = dy as f32 - dst_center;

            let sx = px * cos_a - py * sin_a + src_center;
            let sy = px * sin_a + py * cos_a + src_center;

            let out = if sx < 0.0 || sx > src_dim as f32 - 1.0 || sy < 0.0 || sy > src_dim as f32 - 1.0
            {
                T::ZERO
            } else {
                let x = sx.round() as usize;
                let y = sy.round() as usize;
                src[y * src_dim + x]
            };

            dst[dy * dst_dim + dx] = out;
        }
    }

    dst
}

/// Lossless 90-degree clockwise rotation of a square row-major array.
fn rotate90_cw<T: Element>(src: &[T], dim: usize) -> Vec<T> {
    let mut dst = vec![T::ZERO; dim * dim];
    for y in 0..dim {
        for x in 0..dim {
            dst[y * dim + x] = src[(dim - 1 - x) * dim + y];
        }
    }
    dst
}

/// Horizontal mirror of a square row-major array.
fn mirror_horizontal<T: Element>(src: &[T], dim: usize) -> Vec<T> {
    let mut dst = vec![T::ZERO; dim * dim];
    for y in 0..dim {
        for x in 0..dim {
            dst[y * dim + x] = src[y * dim + (dim - 1 - x)];
        }
    }
    dst
}

/// Builds the full `N_t`-variant stack for one training or mapping image,
/// as a flat buffer of `N_t * neuron_dim * neuron_dim` elements.
///
/// `N_t = num_rot * (if flip { 2 } else { 1 })`. The identity-crop (angle 0,
/// no rotation) is always variant 0.
pub fn generate_variant_stack<T: Element>(
    image: &[T],
    image_dim: usize,
    neuron_dim: usize,
    num_rot: u32,
    flip: bool,
    interpolation: Interpolation,
) -> Result<Vec<T>> {
    validate_num_rot(num_rot)?;

    let neuron_size = neuron_dim * neuron_dim;
    let mut variants: Vec<Vec<T>> = Vec::with_capacity(num_rot as usize);

    if num_rot == 1 {
        variants.push(resample(image, image_dim, neuron_dim, 0.0, interpolation));
    } else {
        let families = num_rot / 4;
        let step = std::f32::consts::FRAC_PI_2 / families as f32;
        for k in 0..families {
            let alpha = k as f32 * step;
            let base = resample(image, image_dim, neuron_dim, alpha, interpolation);
            let r90 = rotate90_cw(&base, neuron_dim);
            let r180 = rotate90_cw(&r90, neuron_dim);
            let r270 = rotate90_cw(&r180, neuron_dim);
            variants.push(base);
            variants.push(r90);
            variants.push(r180);
            variants.push(r270);
        }
    }

    if flip {
        let mirrored: Vec<Vec<T>> = variants
            .iter()
            .map(|v| mirror_horizontal(v, neuron_dim))
            .collect();
        variants.extend(mirrored);
    }

    let mut stack = Vec::with_capacity(variants.len() * neuron_size);
    for v in variants {
        stack.extend_from_slice(&v);
    }
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_num_rot_not_one_or_multiple_of_four() {
        assert!(validate_num_rot(0).is_err());
        assert!(validate_num_rot(2).is_err());
        assert!(validate_num_rot(3).is_err());
        assert!(validate_num_rot(1).is_ok());
        assert!(validate_num_rot(4).is_ok());
        assert!(validate_num_rot(8).is_ok());
    }

    #[test]
    fn identity_crop_at_equal_dims_is_exact_copy() {
        let image: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let out = resample(&image, 2, 2, 0.0, Interpolation::Bilinear);
        assert_eq!(out, image);
    }

    #[test]
    fn variant_stack_cardinality_matches_num_rot_and_flip() {
        let image: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let stack = generate_variant_stack(&image, 4, 2, 4, false, Interpolation::Bilinear).unwrap();
        assert_eq!(stack.len(), 4 * 2 * 2);

        let stack_flipped =
            generate_variant_stack(&image, 4, 2, 4, true, Interpolation::Bilinear).unwrap();
        assert_eq!(stack_flipped.len(), 8 * 2 * 2);
    }

    #[test]
    fn ninety_degree_shuffle_is_its_own_inverse_after_four_turns() {
        let image: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let once = rotate90_cw(&image, 3);
        let twice = rotate90_cw(&once, 3);
        let thrice = rotate90_cw(&twice, 3);
        let full_turn = rotate90_cw(&thrice, 3);
        assert_eq!(full_turn, image);
    }

    #[test]
    fn mirror_is_involutive() {
        let image: Vec<f32> = (0..9).map(|v| v as f32).collect();
        let mirrored_twice = mirror_horizontal(&mirror_horizontal(&image, 3), 3);
        assert_eq!(mirrored_twice, image);
    }

    #[test]
    fn out_of_bounds_samples_read_as_zero() {
        let image: Vec<f32> = vec![1.0; 4];
        // Rotating a 2x2 into a 3x3 neuron pushes corner destinations off the
        // source image entirely.
        let out = resample(&image, 2, 3, std::f32::consts::FRAC_PI_4, Interpolation::Bilinear);
        assert!(out.iter().any(|&v| v == 0.0));
    }
}
