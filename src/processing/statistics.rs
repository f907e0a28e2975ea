//! Summary statistics over chart columns.

use serde::Serialize;

use crate::types::DataSet;

/// Summary of all non-missing values across a set of columns.
///
/// Percentiles are `None` only in [`StatisticsSummary::FALLBACK`]; they are omitted when
/// serialized in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p95: Option<f64>,
}

impl StatisticsSummary {
    /// Returned when there is nothing to summarize.
    pub const FALLBACK: Self = Self {
        min: 0.0,
        max: 100.0,
        mean: 50.0,
        std: 25.0,
        p5: None,
        p95: None,
    };

    /// Summarize a collection of finite values; empty input gives [`Self::FALLBACK`].
    pub fn from_values(mut values: Vec<f64>) -> Self {
        if values.is_empty() {
            return Self::FALLBACK;
        }

        values.sort_by(f64::total_cmp);
        let (min, max) = (values[0], values[values.len() - 1]);

        // Sums run on values scaled into [-1, 1] so large finite inputs cannot overflow.
        let scale = min.abs().max(max.abs());
        let (mean, std) = if scale == 0.0 {
            (0.0, 0.0)
        } else {
            let n = values.len() as f64;
            let scaled_mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
            let scaled_var = values.iter().map(|v| (v / scale - scaled_mean).powi(2)).sum::<f64>() / n;
            ((scaled_mean * scale).clamp(min, max), scaled_var.sqrt() * scale)
        };

        Self {
            min,
            max,
            mean,
            std,
            p5: Some(percentile_sorted(&values, 5.0)),
            p95: Some(percentile_sorted(&values, 95.0)),
        }
    }

    /// Returns `true` if this is the no-data fallback.
    pub fn is_fallback(&self) -> bool {
        *self == Self::FALLBACK
    }
}

/// Linear-interpolation percentile (`p` in `0..=100`) of an ascending, non-empty slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let (a, b) = (sorted[lo], sorted[hi]);
    (a * (1.0 - frac) + b * frac).clamp(a, b)
}

/// Summarize all non-missing values of `columns` across every row of `dataset`.
///
/// Names not present in the dataset are ignored.
pub fn summarize<I, S>(dataset: &DataSet, columns: I) -> StatisticsSummary
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let values: Vec<f64> = columns
        .into_iter()
        .filter_map(|c| dataset.column_f64(c.as_ref()))
        .flatten()
        .flatten()
        .collect();
    StatisticsSummary::from_values(values)
}
