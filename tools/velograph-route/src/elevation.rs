//! Elevation profiles sampled along routes

use velograph_common::error::check_argument;
use velograph_common::functions::Sampled;
use velograph_common::{math, Result};

use crate::route::Route;

/// Elevations sampled at uniform spacing over `[0, length]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationProfile {
    function: Sampled,
    min_elevation: f64,
    max_elevation: f64,
    total_ascent: f64,
    total_descent: f64,
}

impl ElevationProfile {
    /// Requires a positive length and at least two samples.
    pub fn new(length: f64, samples: impl Into<Vec<f32>>) -> Result<Self> {
        let samples = samples.into();
        check_argument(length > 0.0 && length.is_finite(), || {
            format!("profile length must be positive, got {length}")
        })?;
        check_argument(samples.len() >= 2, || {
            format!("profile needs at least 2 samples, got {}", samples.len())
        })?;

        let mut min_elevation = f64::INFINITY;
        let mut max_elevation = f64::NEG_INFINITY;
        for &sample in &samples {
            min_elevation = min_elevation.min(f64::from(sample));
            max_elevation = max_elevation.max(f64::from(sample));
        }
        let (mut total_ascent, mut total_descent) = (0.0, 0.0);
        for pair in samples.windows(2) {
            let delta = f64::from(pair[1]) - f64::from(pair[0]);
            if delta > 0.0 {
                total_ascent += delta;
            } else {
                total_descent -= delta;
            }
        }

        Ok(Self {
            function: Sampled::new(samples, length)?,
            min_elevation,
            max_elevation,
            total_ascent,
            total_descent,
        })
    }

    pub fn length(&self) -> f64 {
        self.function.x_max()
    }

    pub fn samples(&self) -> &[f32] {
        self.function.samples()
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    /// Sum of the positive differences between consecutive samples.
    pub fn total_ascent(&self) -> f64 {
        self.total_ascent
    }

    /// Sum of the magnitudes of the negative differences.
    pub fn total_descent(&self) -> f64 {
        self.total_descent
    }

    /// Interpolated elevation; positions outside the profile take the nearest
    /// end sample.
    pub fn elevation_at(&self, position: f64) -> f64 {
        self.function.apply(position)
    }
}

/// Sample `route` at most `max_step_length` metres apart and fill in the
/// samples that fall on edges without a profile.
///
/// Unknown samples before the first known one take its value, those after
/// the last known one take that value, and interior gaps are interpolated
/// linearly between their neighbours. A route without any known elevation
/// yields a flat profile at zero.
pub fn compute_profile(route: &Route, max_step_length: f64) -> Result<ElevationProfile> {
    check_argument(max_step_length > 0.0, || {
        format!("maximum step length must be positive, got {max_step_length}")
    })?;
    let length = route.length();
    check_argument(length > 0.0, || "cannot profile a route of length zero")?;

    let count = (length / max_step_length).ceil() as usize + 1;
    let spacing = length / (count - 1) as f64;
    let raw: Vec<Option<f64>> = (0..count).map(|i| route.elevation_at(i as f64 * spacing)).collect();

    ElevationProfile::new(length, fill_gaps(&raw))
}

fn fill_gaps(raw: &[Option<f64>]) -> Vec<f32> {
    let mut filled = vec![0.0f32; raw.len()];
    let Some(first_known) = raw.iter().position(Option::is_some) else {
        return filled;
    };

    // Known value most recently seen, with its index.
    let mut previous: Option<(usize, f64)> = None;
    for (i, sample) in raw.iter().enumerate() {
        let Some(y1) = *sample else { continue };
        filled[i] = y1 as f32;
        match previous {
            None => filled[..first_known].fill(y1 as f32),
            Some((j, y0)) if i > j + 1 => {
                let n = (i - j) as f64;
                for (k, slot) in filled[j + 1..i].iter_mut().enumerate() {
                    *slot = math::interpolate(y0, y1, (k + 1) as f64 / n) as f32;
                }
            }
            Some(_) => {}
        }
        previous = Some((i, y1));
    }
    if let Some((last_known, y)) = previous {
        filled[last_known + 1..].fill(y as f32);
    }
    filled
}
