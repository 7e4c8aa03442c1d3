/// Arithmetic mean of a slice. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (denominator `n`) around a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// `part / total`, or 0.0 when `total` is zero.
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Count per kilometer over `length_m` meters, or 0.0 for a zero-length segment.
pub fn per_km(count: usize, length_m: f64) -> f64 {
    if length_m > 0.0 {
        count as f64 / (length_m / 1000.0)
    } else {
        0.0
    }
}

/// Whole-number percentage used in narrative text.
pub fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round() as i64
}

pub fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(v))
}
