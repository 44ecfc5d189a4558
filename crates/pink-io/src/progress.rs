// Copyright 2025 PINK contributors
// SPDX-License-Identifier: Apache-2.0

//! The progress printer (SPEC_FULL §6): consumes `tracing` events emitted
//! by the Trainer/Mapper facade rather than writing to `stdout` directly,
//! matching `mapping.cpp`'s `progressFactor` default of printing roughly
//! ten times per run.

/// Resolves the effective "print every N images" cadence.
///
/// An explicit `--progress` always wins. Otherwise the default mirrors the
/// original's `progressFactor`: one line per `max(1, num_images / 10)`
/// images, so a run prints roughly ten times regardless of its size.
pub fn resolve_progress_every(explicit: Option<u64>, num_images: u64) -> Option<u64> {
    match explicit {
        Some(0) => None,
        Some(n) => Some(n),
        None => {
            if num_images == 0 {
                None
            } else {
                Some((num_images / 10).max(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_progress_overrides_the_default() {
        assert_eq!(resolve_progress_every(Some(5), 1000), Some(5));
    }

    #[test]
    fn zero_explicit_progress_disables_reporting() {
        assert_eq!(resolve_progress_every(Some(0), 1000), None);
    }

    #[test]
    fn default_prints_roughly_ten_times() {
        assert_eq!(resolve_progress_every(None, 1000), Some(100));
        assert_eq!(resolve_progress_every(None, 3), Some(1));
        assert_eq!(resolve_progress_every(None, 0), None);
    }
}
