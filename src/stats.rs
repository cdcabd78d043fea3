//! Statistical primitives
//!
//! Pure numeric helpers shared by every engine. All of them accept empty or
//! short inputs and return a documented degenerate value instead of failing.
//! Results keep full precision unless stated; rounding happens where records
//! leave the engine.

/// Round to a number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// `100 * part / total`, rounded to 2dp. Zero when `total` is zero.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round2(part / total * 100.0)
}

/// Arithmetic mean. Zero for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median (mean of the two middle values for even lengths). Zero when empty.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sorted = sorted(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1). Zero for fewer than two samples.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = average(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Ordinary least squares slope of `values` against their index.
///
/// Zero for fewer than two points.
pub fn regression_slope(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = average(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Sliding-window mean, each value rounded to 2dp.
///
/// Returns the input unchanged when it is shorter than `window`.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return values.to_vec();
    }
    values
        .windows(window)
        .map(|w| round2(w.iter().sum::<f64>() / window as f64))
        .collect()
}

/// Stability score in `[0, 100]`: `100 - cv * 100`, floored at zero.
///
/// Fewer than two values score 100; a zero mean scores 0.
pub fn consistency_score(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 100.0;
    }
    let mean = average(values);
    if mean == 0.0 {
        return 0.0;
    }
    let cv = std_dev(values) / mean;
    (100.0 - cv * 100.0).max(0.0)
}

/// Standard score. Zero when `std_dev` is zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

/// Percentile rank: share of `values` strictly below `value`, in percent (2dp).
pub fn percentile(value: f64, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|v| **v < value).count();
    percentage(below as f64, values.len() as f64)
}

/// Index-based quartiles (no interpolation)
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Quartiles taken at sorted indices `n/4`, `n/2` and `3n/4`. All zero when empty.
pub fn quartile(values: &[f64]) -> Quartiles {
    if values.is_empty() {
        return Quartiles::default();
    }
    let sorted = sorted(values);
    let n = sorted.len();
    Quartiles {
        q1: sorted[n / 4],
        q2: sorted[n / 2],
        q3: sorted[(3 * n) / 4],
    }
}

/// Indices of values outside `[q1 - k*iqr, q3 + k*iqr]`.
///
/// Quartiles are interpolated between closest ranks. Needs at least four
/// values, otherwise nothing is flagged.
pub fn iqr_outliers(values: &[f64], multiplier: f64) -> Vec<usize> {
    if values.len() < 4 {
        return Vec::new();
    }
    let sorted = sorted(values);
    let q1 = interpolated_percentile(&sorted, 25.0);
    let q3 = interpolated_percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < lower || **v > upper)
        .map(|(i, _)| i)
        .collect()
}

fn interpolated_percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_guards_zero_total() {
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 3.0), 33.33);
    }

    #[test]
    fn test_average_median_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((average(&values) - 5.0).abs() < 1e-9);
        assert!((median(&values) - 4.5).abs() < 1e-9);
        // sample variance = 32 / 7
        assert!((std_dev(&values) - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);

        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(std_dev(&[42.0]), 0.0);
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn test_regression_slope_arithmetic_sequence() {
        let values: Vec<f64> = (0..6).map(|i| 12.5 + 3.25 * i as f64).collect();
        assert!((regression_slope(&values) - 3.25).abs() < 1e-9);

        let declining = [90.0, 80.0, 70.0];
        assert!((regression_slope(&declining) + 10.0).abs() < 1e-9);

        assert_eq!(regression_slope(&[55.0]), 0.0);
        assert_eq!(regression_slope(&[]), 0.0);
    }

    #[test]
    fn test_moving_average() {
        let values = [40.0, 50.0, 60.0, 70.0, 80.0];
        assert_eq!(moving_average(&values, 3), vec![50.0, 60.0, 70.0]);

        // Full window collapses to the rounded mean
        let odd = [10.0, 20.0, 25.0];
        assert_eq!(moving_average(&odd, odd.len()), vec![round2(average(&odd))]);

        // Short input is returned as-is
        assert_eq!(moving_average(&[1.0, 2.0], 5), vec![1.0, 2.0]);
    }

    #[test]
    fn test_consistency_score() {
        assert_eq!(consistency_score(&[65.0, 65.0, 65.0, 65.0]), 100.0);
        assert_eq!(consistency_score(&[80.0]), 100.0);
        assert_eq!(consistency_score(&[0.0, 0.0]), 0.0);

        // Huge spread floors at zero
        assert_eq!(consistency_score(&[1.0, 100.0, 1.0]), 0.0);

        let score = consistency_score(&[40.0, 50.0, 60.0, 70.0, 80.0]);
        let expected = 100.0 - std_dev(&[40.0, 50.0, 60.0, 70.0, 80.0]) / 60.0 * 100.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_z_score_and_percentile() {
        assert!((z_score(70.0, 60.0, 5.0) - 2.0).abs() < 1e-9);
        assert_eq!(z_score(70.0, 60.0, 0.0), 0.0);

        let values = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(30.0, &values), 50.0);
        assert_eq!(percentile(5.0, &values), 0.0);
        assert_eq!(percentile(5.0, &[]), 0.0);
    }

    #[test]
    fn test_quartile_is_index_based() {
        let q = quartile(&[7.0, 1.0, 5.0, 3.0, 9.0, 11.0, 13.0, 15.0]);
        // sorted: 1 3 5 7 9 11 13 15 -> indices 2, 4, 6
        assert_eq!(q, Quartiles { q1: 5.0, q2: 9.0, q3: 13.0 });
        assert_eq!(quartile(&[]), Quartiles::default());
    }

    #[test]
    fn test_iqr_outliers() {
        let values = [50.0, 52.0, 51.0, 49.0, 53.0, 5.0, 98.0];
        assert_eq!(iqr_outliers(&values, 1.5), vec![5, 6]);

        assert!(iqr_outliers(&[1.0, 100.0, 1000.0], 1.5).is_empty());
        assert!(iqr_outliers(&[60.0, 60.0, 60.0, 60.0], 1.5).is_empty());
    }
}
