// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! Radial distribution kernels: `φ(d) → weight` for the Updater's
//! neighborhood function, parameterized by a width `sigma` and a peak
//! `damping`.

use pink_types::DistFunc;

/// A distribution kernel bound to its `(sigma, damping)` parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    pub shape: DistFunc,
    pub sigma: f32,
    pub damping: f32,
}

impl Kernel {
    pub fn new(shape: DistFunc, sigma: f32, damping: f32) -> Self {
        Kernel {
            shape,
            sigma,
            damping,
        }
    }

    /// Radial weight at lattice distance `d`, as the normalized-PDF form of
    /// the gaussian (peak `damping / (sigma * sqrt(2*pi))` at `d = 0`, not
    /// bare `damping`) — confirmed against spec.md's own worked example
    /// (`Gaussian(1.1, 0.2)` on a zero-init 2x2 SOM, bottom-right pixel of
    /// neuron (1,1) equals `155767632`), which only reproduces under this
    /// normalization. Mexican hat carries the same `1/(sigma*sqrt(2*pi))`
    /// factor for consistency between the two shapes. May go negative for
    /// `d > sigma`, which is the intended surround-inhibition behavior.
    pub fn weight(&self, d: f32) -> f32 {
        let sigma_sq = self.sigma * self.sigma;
        let gauss = (-d * d / (2.0 * sigma_sq)).exp();
        let norm = 1.0 / (self.sigma * (2.0 * std::f32::consts::PI).sqrt());
        match self.shape {
            DistFunc::Gaussian => self.damping * norm * gauss,
            DistFunc::MexicanHat => self.damping * norm * (1.0 - d * d / sigma_sq) * gauss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_peaks_at_normalized_damping_for_zero_distance() {
        let k = Kernel::new(DistFunc::Gaussian, 1.1, 0.2);
        let expected = 0.2 / (1.1 * (2.0 * std::f32::consts::PI).sqrt());
        assert!((k.weight(0.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn gaussian_zero_distance_weight_matches_worked_example() {
        // spec.md's end-to-end scenario: Gaussian(1.1, 0.2) applied to a
        // pixel value of 2147483647 must land on 155767632.
        let k = Kernel::new(DistFunc::Gaussian, 1.1, 0.2);
        let moved = (k.weight(0.0) as f64 * 2147483647.0) as i64;
        assert!((moved - 155767632).abs() <= 16);
    }

    #[test]
    fn gaussian_decays_toward_zero_with_distance() {
        let k = Kernel::new(DistFunc::Gaussian, 1.1, 0.2);
        assert!(k.weight(5.0) < k.weight(1.0));
        assert!(k.weight(5.0) >= 0.0);
    }

    #[test]
    fn mexican_hat_goes_negative_beyond_sigma() {
        let k = Kernel::new(DistFunc::MexicanHat, 1.0, 1.0);
        assert!(k.weight(2.0) < 0.0);
        assert!(k.weight(0.0) > 0.0);
    }
}
