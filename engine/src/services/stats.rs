//! Stats kernel (component A): percentile, entropy, bounded normalization.
//!
//! No direct teacher file grounds this module — it is small enough and
//! numerically precise enough (spec.md §4.A, §8) that it is written
//! directly from the contract rather than adapted from an existing
//! service. Every other analyzer in this crate calls into it.

/// Returns `sorted[floor(p * len / 100)]`, clamped to a valid index.
/// Not a smoothed/interpolated percentile. Returns `0.0` on empty input.
pub fn percentile(sorted: &[f64], p: u32) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let len = sorted.len();
    let idx = (p as usize * len) / 100;
    let idx = idx.min(len - 1);
    sorted[idx]
}

/// Shannon entropy in bits over a discrete weight distribution.
/// Returns `0.0` when the total weight is zero or there is at most one key.
pub fn entropy<K>(weights: &std::collections::HashMap<K, i64>) -> f64 {
    let total: i64 = weights.values().sum();
    if total <= 0 || weights.len() <= 1 {
        return 0.0;
    }
    let total = total as f64;
    -weights
        .values()
        .filter(|&&w| w > 0)
        .map(|&w| {
            let p = w as f64 / total;
            p * p.log2()
        })
        .sum::<f64>()
}

/// `0` when `max <= 0` or `v <= 0`; else `min(v/max, 1)`.
pub fn safe_normalize(v: f64, max: f64) -> f64 {
    if max <= 0.0 || v <= 0.0 {
        return 0.0;
    }
    (v / max).min(1.0)
}

/// Linear interpolation over a sorted table of `(x, y)` knots. Values
/// below the first knot or above the last are clamped to the table's
/// endpoints. Used by the defect analyzer's empirical CDF tables.
pub fn interpolate(knots: &[(f64, f64)], x: f64) -> f64 {
    if knots.is_empty() {
        return 0.0;
    }
    if x <= knots[0].0 {
        return knots[0].1;
    }
    if x >= knots[knots.len() - 1].0 {
        return knots[knots.len() - 1].1;
    }
    for window in knots.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x >= x0 && x <= x1 {
            if (x1 - x0).abs() < f64::EPSILON {
                return y0;
            }
            let t = (x - x0) / (x1 - x0);
            return y0 + t * (y1 - y0);
        }
    }
    knots[knots.len() - 1].1
}

/// Population mean, variance, stddev, p50 and p95 of a metric vector.
/// `values` need not be pre-sorted; this sorts an owned copy internally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Distribution {
    pub mean: f64,
    pub variance: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p95: f64,
}

pub fn distribution(values: &[f64]) -> Distribution {
    if values.is_empty() {
        return Distribution::default();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    Distribution {
        mean,
        variance,
        stddev: variance.sqrt(),
        p50: percentile(&sorted, 50),
        p95: percentile(&sorted, 95),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn entropy_of_equal_distribution() {
        let mut weights = HashMap::new();
        weights.insert("a", 25);
        weights.insert("b", 25);
        weights.insert("c", 25);
        weights.insert("d", 25);
        assert!((entropy(&weights) - 2.0).abs() < 0.001);
    }

    #[test]
    fn entropy_of_single_key_is_zero() {
        let mut weights = HashMap::new();
        weights.insert("only", 42);
        assert_eq!(entropy(&weights), 0.0);
    }

    #[test]
    fn entropy_of_empty_is_zero() {
        let weights: HashMap<&str, i64> = HashMap::new();
        assert_eq!(entropy(&weights), 0.0);
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 50), 0.0);
    }

    #[test]
    fn safe_normalize_zero_max_is_zero() {
        assert_eq!(safe_normalize(5.0, 0.0), 0.0);
    }

    #[test]
    fn safe_normalize_clamps_to_one() {
        assert_eq!(safe_normalize(20.0, 10.0), 1.0);
    }

    #[test]
    fn safe_normalize_negative_value_is_zero() {
        assert_eq!(safe_normalize(-3.0, 10.0), 0.0);
    }

    #[test]
    fn interpolate_matches_churn_cdf_example() {
        let knots = [(0.0, 0.0), (0.3, 0.30), (0.5, 0.70), (0.7, 0.93), (1.0, 1.0)];
        assert!((interpolate(&knots, 0.3) - 0.30).abs() < 1e-9);
        assert!((interpolate(&knots, 0.4) - 0.50).abs() < 1e-9);
        assert_eq!(interpolate(&knots, -1.0), 0.0);
        assert_eq!(interpolate(&knots, 2.0), 1.0);
    }
}
