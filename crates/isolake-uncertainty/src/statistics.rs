//! Summary statistics of Monte Carlo outputs.
//!
//! Non-finite values (failed trials) are excluded before aggregation and counted separately.

use serde::{Deserialize, Serialize};

/// Lower percentile of the reported band (one standard deviation below the median of a normal
/// distribution).
pub const LOWER_PERCENTILE: f64 = 15.9;
/// Upper percentile of the reported band.
pub const UPPER_PERCENTILE: f64 = 84.1;

/// Aggregate statistics of one output variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSummary {
    pub variable: String,
    /// Number of finite values aggregated.
    pub sample_count: usize,
    /// Number of non-finite values excluded.
    pub excluded_count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    #[serde(rename = "stdev")]
    pub std_dev: f64,
    pub p15_9: f64,
    pub p84_1: f64,
    pub min: f64,
    pub max: f64,
}

/// Least-squares line of one output against one input, $y = \text{slope} \cdot x + \text{intercept}$.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearTrend {
    pub input: String,
    pub output: String,
    pub slope: f64,
    pub intercept: f64,
    /// Number of finite pairs fitted.
    pub sample_count: usize,
}

/// Fit a straight line through the finite `(x, y)` pairs.
///
/// Returns `None` with fewer than two pairs or when every `x` is the same.
pub fn linear_fit<I>(pairs: I) -> Option<(f64, f64, usize)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let pairs: Vec<(f64, f64)> = pairs
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let x_mean = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_mean = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (sxy, sxx) = pairs.iter().fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
        let dx = x - x_mean;
        (sxy + dx * (y - y_mean), sxx + dx * dx)
    });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean, pairs.len()))
}

/// Linearly interpolated percentile of sorted values.
///
/// `p` is in percent. Returns NaN for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (n as f64 - 1.0);
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            if lower == upper {
                sorted[lower]
            } else {
                let w = rank - lower as f64;
                sorted[lower] + (sorted[upper] - sorted[lower]) * w
            }
        }
    }
}

/// Mean and population standard deviation.
///
/// Deviations are taken from the first value before averaging, so that identical inputs give
/// exactly that value and a standard deviation of exactly zero.
fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let shift = values[0];
    let mean = shift + values.iter().map(|v| v - shift).sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Summarise the values of one output variable.
pub fn summarize<I>(variable: &str, values: I) -> OutputSummary
where
    I: IntoIterator<Item = f64>,
{
    let mut total = 0;
    let mut finite: Vec<f64> = values
        .into_iter()
        .inspect(|_| total += 1)
        .filter(|v| v.is_finite())
        .collect();
    let excluded_count = total - finite.len();

    if finite.is_empty() {
        return OutputSummary {
            variable: variable.to_string(),
            sample_count: 0,
            excluded_count,
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            p15_9: f64::NAN,
            p84_1: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        };
    }

    finite.sort_by(|a, b| a.total_cmp(b));
    let (mean, std_dev) = mean_and_std(&finite);

    OutputSummary {
        variable: variable.to_string(),
        sample_count: finite.len(),
        excluded_count,
        mean,
        median: percentile(&finite, 50.0),
        std_dev,
        p15_9: percentile(&finite, LOWER_PERCENTILE),
        p84_1: percentile(&finite, UPPER_PERCENTILE),
        min: finite[0],
        max: finite[finite.len() - 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_percentile_interpolates_between_points() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&values, 25.0), 1.75);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn test_identical_values_have_zero_spread() {
        let x = 0.383077828236954;
        let summary = summarize("x", std::iter::repeat(x).take(1000));
        assert_eq!(summary.mean, x);
        assert_eq!(summary.median, x);
        assert_eq!(summary.p15_9, x);
        assert_eq!(summary.p84_1, x);
        assert_eq!(summary.min, x);
        assert_eq!(summary.max, x);
        assert_eq!(summary.std_dev, 0.0);
    }

    #[test]
    fn test_non_finite_values_excluded() {
        let summary = summarize("x", vec![1.0, f64::NAN, 3.0, f64::INFINITY, 2.0]);
        assert_eq!(summary.sample_count, 3);
        assert_eq!(summary.excluded_count, 2);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.median, 2.0);
        assert_relative_eq!(summary.std_dev, (2.0f64 / 3.0).sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_all_failed() {
        let summary = summarize("x", vec![f64::NAN; 4]);
        assert_eq!(summary.sample_count, 0);
        assert_eq!(summary.excluded_count, 4);
        assert!(summary.mean.is_nan() && summary.max.is_nan());
    }

    #[test]
    fn test_linear_fit_recovers_line() {
        let pairs = (0..50).map(|i| {
            let x = -16.0 + 0.1 * i as f64;
            (x, 0.05 * x + 1.2)
        });
        let (slope, intercept, n) = linear_fit(pairs).unwrap();
        assert_relative_eq!(slope, 0.05, epsilon = 1e-12);
        assert_relative_eq!(intercept, 1.2, epsilon = 1e-10);
        assert_eq!(n, 50);
    }

    #[test]
    fn test_linear_fit_degenerate() {
        assert!(linear_fit(vec![(1.0, 2.0)]).is_none());
        assert!(linear_fit(vec![(1.0, 2.0), (1.0, 3.0)]).is_none());
        let (slope, _, n) = linear_fit(vec![(0.0, 0.0), (f64::NAN, 5.0), (1.0, 2.0)]).unwrap();
        assert_eq!(slope, 2.0);
        assert_eq!(n, 2);
    }

    #[test]
    fn test_band_percentiles() {
        let values: Vec<f64> = (0..=1000).map(|i| i as f64).collect();
        let summary = summarize("v", values);
        assert_relative_eq!(summary.p15_9, 159.0, epsilon = 1e-9);
        assert_relative_eq!(summary.p84_1, 841.0, epsilon = 1e-9);
        assert_eq!(summary.median, 500.0);
    }
}
