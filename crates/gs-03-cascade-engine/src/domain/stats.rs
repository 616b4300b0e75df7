//! # Aggregate Statistics
//!
//! Percentile confidence intervals over per-run samples (the empirical
//! bootstrap of the run distribution itself) plus small helpers shared by
//! the aggregator.

/// Arithmetic mean; 0 for an empty slice.
#[must_use]
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Linear-interpolated percentile of a sorted slice, `q` in [0, 100].
#[must_use]
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Two-sided percentile confidence interval at `confidence` in (0, 1).
///
/// Sorts the samples in place.
#[must_use]
pub fn percentile_ci(samples: &mut [f64], confidence: f64) -> (f64, f64) {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let alpha = 1.0 - confidence;
    (
        percentile(samples, alpha / 2.0 * 100.0),
        percentile(samples, (1.0 - alpha / 2.0) * 100.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_ci_bounds_widen_with_confidence() {
        let mut samples: Vec<f64> = (0..1000).map(f64::from).collect();
        let narrow = percentile_ci(&mut samples.clone(), 0.50);
        let wide = percentile_ci(&mut samples, 0.99);
        assert!(wide.0 <= narrow.0);
        assert!(wide.1 >= narrow.1);
    }

    #[test]
    fn test_ci_degenerate_distribution() {
        let mut samples = vec![7.0; 40];
        assert_eq!(percentile_ci(&mut samples, 0.95), (7.0, 7.0));
    }
}
