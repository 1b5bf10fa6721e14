//! Density estimates backing each violin.

use std::f64::consts::PI;

use crate::stats;

/// Number of points the density is evaluated at.
pub const GRID_POINTS: usize = 100;

/// The outline of a single violin, before it is placed on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Violin {
  /// `(value, density)` pairs, in increasing `value`. The grid spans exactly
  /// the observed samples: the estimate is never extrapolated.
  pub profile: Vec<(f64, f64)>,
  pub q1: f64,
  pub median: f64,
  pub q3: f64,
}

impl Violin {
  /// Estimates the density of `samples`. `None` when there are no samples.
  ///
  /// A single sample, or samples with no spread, yield a profile of one point
  /// with unit density, drawn as a flat line.
  pub fn new(samples: &[f64]) -> Option<Self> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (&lo, &hi) = (sorted.first()?, sorted.last()?);
    let q1 = stats::quantile(&sorted, 0.25)?;
    let median = stats::quantile(&sorted, 0.5)?;
    let q3 = stats::quantile(&sorted, 0.75)?;

    let profile = match bandwidth(&sorted) {
      Some(h) if hi > lo => (0..GRID_POINTS)
        .map(|i| {
          let x = lo + (hi - lo) * i as f64 / (GRID_POINTS - 1) as f64;
          (x, gaussian_kde(&sorted, h, x))
        })
        .collect(),
      _ => vec![(median, 1.0)],
    };

    Some(Self {
      profile,
      q1,
      median,
      q3,
    })
  }

  pub fn is_flat(&self) -> bool {
    self.profile.len() < 2
  }

  pub fn max_density(&self) -> f64 {
    self.profile.iter().map(|&(_, d)| d).fold(0.0, f64::max)
  }
}

/// Scott's rule: `sigma * n^(-1/5)`. `None` when the samples have no spread.
pub fn bandwidth(samples: &[f64]) -> Option<f64> {
  let sigma = stats::sample_std(samples)?;
  let h = sigma * (samples.len() as f64).powf(-0.2);

  (h > 0.0 && h.is_finite()).then_some(h)
}

fn gaussian_kde(samples: &[f64], h: f64, x: f64) -> f64 {
  let norm = samples.len() as f64 * h * (2.0 * PI).sqrt();

  samples
    .iter()
    .map(|s| {
      let u = (x - s) / h;
      (-0.5 * u * u).exp()
    })
    .sum::<f64>()
    / norm
}

/// Largest density across `violins`, used so every violin on a chart shares
/// one width scale.
pub fn density_scale<'a, I: IntoIterator<Item = &'a Violin>>(violins: I) -> f64 {
  violins.into_iter().map(Violin::max_density).fold(0.0, f64::max)
}
