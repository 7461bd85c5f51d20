use std::iter::FromIterator;

use recon_core::errors::{ErrorInfo, ReconError};
use serde::{Deserialize, Serialize};

/// Multiplier applied to the inter-quartile range when placing Tukey fences.
pub const TUKEY_FENCE: f64 = 1.5;

/// Repeated measurements of one strategy on one entity.
///
/// Missing ("no solution") markers are stored as NaN.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    values: Vec<f64>,
}

impl Sample {
    /// Wraps the provided values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Builds a sample where `None` entries become missing markers.
    pub fn from_options<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect()
    }

    /// Raw measurements in input order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of measurements, missing markers included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the sample holds no measurement at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true when at least one measurement is a missing marker.
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(|value| value.is_nan())
    }

    /// Arithmetic mean, `None` for an empty sample.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }
}

impl FromIterator<f64> for Sample {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// The five probabilities every summary is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Probability {
    /// 5th percentile.
    P05,
    /// Lower quartile.
    P25,
    /// Median.
    P50,
    /// Upper quartile.
    P75,
    /// 95th percentile.
    P95,
}

impl Probability {
    /// All probabilities in ascending order.
    pub const ALL: [Probability; 5] = [
        Probability::P05,
        Probability::P25,
        Probability::P50,
        Probability::P75,
        Probability::P95,
    ];

    /// Numeric probability in `[0, 1]`.
    pub fn value(self) -> f64 {
        match self {
            Probability::P05 => 0.05,
            Probability::P25 => 0.25,
            Probability::P50 => 0.5,
            Probability::P75 => 0.75,
            Probability::P95 => 0.95,
        }
    }

    /// Two digit suffix used in column names (`random_05`, `random_50`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            Probability::P05 => "05",
            Probability::P25 => "25",
            Probability::P50 => "50",
            Probability::P75 => "75",
            Probability::P95 => "95",
        }
    }
}

/// Five point distributional summary with boxplot whiskers and outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileSummary {
    /// 5th percentile estimate.
    pub p05: f64,
    /// Lower quartile estimate.
    pub p25: f64,
    /// Median estimate.
    pub median: f64,
    /// Upper quartile estimate.
    pub p75: f64,
    /// 95th percentile estimate.
    pub p95: f64,
    /// Smallest measurement inside the lower Tukey fence.
    pub whisker_low: f64,
    /// Largest measurement inside the upper Tukey fence.
    pub whisker_high: f64,
    /// Measurements outside the Tukey fences, in sample order.
    pub outliers: Vec<f64>,
}

impl QuantileSummary {
    /// Sentinel summary for strategies that produced no usable sample.
    pub fn undefined() -> Self {
        Self {
            p05: f64::NAN,
            p25: f64::NAN,
            median: f64::NAN,
            p75: f64::NAN,
            p95: f64::NAN,
            whisker_low: f64::NAN,
            whisker_high: f64::NAN,
            outliers: Vec::new(),
        }
    }

    /// Returns true for the [`QuantileSummary::undefined`] sentinel.
    pub fn is_undefined(&self) -> bool {
        self.median.is_nan()
    }

    /// Looks up the estimate for one of the five summary probabilities.
    pub fn quantile(&self, probability: Probability) -> f64 {
        match probability {
            Probability::P05 => self.p05,
            Probability::P25 => self.p25,
            Probability::P50 => self.median,
            Probability::P75 => self.p75,
            Probability::P95 => self.p95,
        }
    }

    /// Inter-quartile range.
    pub fn iqr(&self) -> f64 {
        self.p75 - self.p25
    }

    /// Lower and upper Tukey fences.
    pub fn fences(&self) -> (f64, f64) {
        let spread = TUKEY_FENCE * self.iqr();
        (self.p25 - spread, self.p75 + spread)
    }
}

/// Linear interpolation between the closest ranks of an ascending slice.
pub fn percentile(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let position = quantile * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let weight = position - lower as f64;
        let (low, high) = (sorted[lower], sorted[upper]);
        // Clamped so rounding never breaks monotonicity across ranks.
        (low + (high - low) * weight).max(low).min(high)
    }
}

/// Computes the five point summary of a complete, non-empty sample.
///
/// Samples with missing markers are rejected: the caller applies its
/// missing-value policy before summarising.
pub fn summarize(sample: &Sample) -> Result<QuantileSummary, ReconError> {
    if sample.is_empty() {
        return Err(ReconError::DegenerateSample(ErrorInfo::new(
            "recon_stat.empty_sample",
            "cannot summarise an empty sample",
        )));
    }
    if sample.has_missing() {
        return Err(ReconError::DegenerateSample(
            ErrorInfo::new(
                "recon_stat.missing_values",
                "sample contains missing measurements",
            )
            .with_context("len", sample.len().to_string())
            .with_hint("resolve the missing-value policy before summarising"),
        ));
    }

    let mut sorted = sample.values().to_vec();
    sorted.sort_by(f64::total_cmp);

    let p25 = percentile(&sorted, Probability::P25.value());
    let p75 = percentile(&sorted, Probability::P75.value());
    let spread = TUKEY_FENCE * (p75 - p25);
    let (low_fence, high_fence) = (p25 - spread, p75 + spread);

    let whisker_low = sorted
        .iter()
        .copied()
        .find(|value| *value >= low_fence)
        .filter(|value| *value <= p25)
        .unwrap_or(p25);
    let whisker_high = sorted
        .iter()
        .rev()
        .copied()
        .find(|value| *value <= high_fence)
        .filter(|value| *value >= p75)
        .unwrap_or(p75);

    let outliers = sample
        .values()
        .iter()
        .copied()
        .filter(|value| *value < low_fence || *value > high_fence)
        .collect();

    Ok(QuantileSummary {
        p05: percentile(&sorted, Probability::P05.value()),
        p25,
        median: percentile(&sorted, Probability::P50.value()),
        p75,
        p95: percentile(&sorted, Probability::P95.value()),
        whisker_low,
        whisker_high,
        outliers,
    })
}
