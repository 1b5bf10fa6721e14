/// Population mean and standard deviation of a set of measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
  pub mean: f64,
  pub std: f64,
}

impl Summary {
  /// Returns `None` for an empty slice, where neither statistic is defined.
  pub fn of(samples: &[f64]) -> Option<Self> {
    let mean = mean(samples)?;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

    Some(Self {
      mean,
      std: variance.sqrt(),
    })
  }
}

pub fn mean(samples: &[f64]) -> Option<f64> {
  if samples.is_empty() {
    return None;
  }

  Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Standard deviation with Bessel's correction. `None` for fewer than two
/// samples.
pub fn sample_std(samples: &[f64]) -> Option<f64> {
  if samples.len() < 2 {
    return None;
  }

  let mean = mean(samples)?;
  let sum_sq = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>();

  Some((sum_sq / (samples.len() - 1) as f64).sqrt())
}

/// Linearly interpolated quantile of an already sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
  let last = sorted.len().checked_sub(1)?;
  let pos = q.clamp(0.0, 1.0) * last as f64;
  let lo = pos.floor() as usize;
  let hi = pos.ceil() as usize;
  let frac = pos - lo as f64;

  Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
  use proptest::{collection::vec, prelude::*};

  use super::*;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
  }

  #[test]
  fn population_statistics() {
    let summary = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    assert!(close(summary.mean, 5.0));
    assert!(close(summary.std, 2.0));
  }

  #[test]
  fn single_sample_has_zero_spread() {
    let summary = Summary::of(&[1.0]).unwrap();
    assert_eq!(summary, Summary { mean: 1.0, std: 0.0 });
  }

  #[test]
  fn empty_is_undefined() {
    assert_eq!(Summary::of(&[]), None);
    assert_eq!(mean(&[]), None);
    assert_eq!(sample_std(&[3.0]), None);
  }

  #[test]
  fn bessel_corrected_std() {
    let std = sample_std(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert!(close(std, (5.0f64 / 3.0).sqrt()));
  }

  #[test]
  fn interpolated_quantiles() {
    let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(quantile(&sorted, 0.5), Some(3.0));
    assert_eq!(quantile(&sorted, 0.25), Some(2.0));
    assert_eq!(quantile(&[1.0, 2.0], 0.5), Some(1.5));
    assert_eq!(quantile(&[], 0.5), None);
  }

  proptest! {
    #[test]
    fn summary_matches_population_moments(samples in vec(1e-6f64..1e3, 1..128)) {
      let summary = Summary::of(&samples).unwrap();
      let n = samples.len() as f64;
      let (lo, hi) = samples.iter().fold((f64::INFINITY, 0.0f64), |(lo, hi), &x| (lo.min(x), hi.max(x)));

      prop_assert!(summary.mean >= lo * (1.0 - 1e-12) && summary.mean <= hi * (1.0 + 1e-12));

      // E[x^2] - E[x]^2, computed independently of the two-pass variance
      let second = samples.iter().map(|x| x * x).sum::<f64>() / n;
      let variance = (second - summary.mean * summary.mean).max(0.0);
      prop_assert!((summary.std * summary.std - variance).abs() <= 1e-6 * second.max(1.0));
      prop_assert!(summary.std <= (hi - lo) / 2.0 + 1e-9);
    }

    #[test]
    fn std_ignores_shifts(samples in vec(0.0f64..100.0, 1..64), shift in 0.0f64..1e3) {
      let shifted: Vec<f64> = samples.iter().map(|x| x + shift).collect();
      let a = Summary::of(&samples).unwrap();
      let b = Summary::of(&shifted).unwrap();

      prop_assert!((a.std - b.std).abs() < 1e-6);
      prop_assert!((b.mean - a.mean - shift).abs() < 1e-6);
    }
  }
}
