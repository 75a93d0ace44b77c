//! Piecewise-linear functions over uniformly spaced samples

use std::sync::Arc;

use crate::error::{check_argument, Result};
use crate::math;

/// A function on `[0, x_max]` defined by samples spaced `x_max / (n - 1)`
/// apart and linearly interpolated in between. Arguments below zero map to
/// the first sample, arguments at or beyond `x_max` to the last one.
///
/// Samples are shared, so cloning is cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampled {
    samples: Arc<[f32]>,
    x_max: f64,
}

impl Sampled {
    /// Requires at least one sample and a finite, non-negative `x_max`.
    pub fn new(samples: impl Into<Arc<[f32]>>, x_max: f64) -> Result<Self> {
        let samples = samples.into();
        check_argument(!samples.is_empty(), || "sampled function needs samples")?;
        check_argument(x_max.is_finite() && x_max >= 0.0, || {
            format!("sampled function needs a non-negative domain, got {x_max}")
        })?;
        Ok(Self { samples, x_max })
    }

    /// Like [`Sampled::new`] for arguments the caller already knows to be
    /// valid. Checked in debug builds only.
    pub fn new_unchecked(samples: impl Into<Arc<[f32]>>, x_max: f64) -> Self {
        let samples = samples.into();
        debug_assert!(!samples.is_empty() && x_max.is_finite() && x_max >= 0.0);
        Self { samples, x_max }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn apply(&self, x: f64) -> f64 {
        let n = self.samples.len();
        let first = f64::from(self.samples[0]);
        let last = f64::from(self.samples[n - 1]);
        if x < 0.0 || n == 1 {
            return first;
        }
        if x >= self.x_max {
            return last;
        }
        let delta = self.x_max / (n - 1) as f64;
        let left = ((x / delta).floor() as usize).min(n - 2);
        math::interpolate(
            f64::from(self.samples[left]),
            f64::from(self.samples[left + 1]),
            (x - left as f64 * delta) / delta,
        )
    }
}
