use serde::{Deserialize, Serialize};

use crate::quantile::QuantileSummary;

/// Ratio assigned when the baseline median is zero and the candidate is not.
pub const RATIO_SENTINEL: f64 = 1_000_000.0;

/// Rule that produced a [`Ratio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RatioKind {
    /// Equal, non-zero medians.
    Parity,
    /// Both medians are zero; reported as parity.
    BothZero,
    /// Baseline median is zero while the candidate is not.
    BaselineZero,
    /// Literal quotient of the two medians.
    Quotient,
    /// At least one median is undefined.
    Undefined,
}

/// Candidate median relative to the baseline median.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    /// Numeric ratio as exported.
    pub value: f64,
    /// Rule applied to obtain the value.
    pub kind: RatioKind,
}

impl Ratio {
    /// Applies the tie and division-by-zero rules in priority order.
    pub fn between(baseline: f64, candidate: f64, sentinel: f64) -> Self {
        if baseline.is_nan() || candidate.is_nan() {
            return Self {
                value: f64::NAN,
                kind: RatioKind::Undefined,
            };
        }
        if candidate == baseline {
            let kind = if baseline == 0.0 {
                RatioKind::BothZero
            } else {
                RatioKind::Parity
            };
            return Self { value: 1.0, kind };
        }
        if baseline == 0.0 {
            return Self {
                value: sentinel,
                kind: RatioKind::BaselineZero,
            };
        }
        Self {
            value: candidate / baseline,
            kind: RatioKind::Quotient,
        }
    }
}

/// Comparison of a candidate strategy against a baseline on one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeMetric {
    /// Candidate median over baseline median.
    pub ratio: Ratio,
    /// Baseline median used for the ratio.
    pub baseline_median: f64,
    /// Candidate median used for the ratio.
    pub candidate_median: f64,
    /// Distance of the candidate median above the ideal value, when known.
    pub gap_to_ideal: Option<f64>,
}

/// Compares two summaries using the default [`RATIO_SENTINEL`].
pub fn compare(
    baseline: &QuantileSummary,
    candidate: &QuantileSummary,
    ideal: Option<f64>,
) -> ComparativeMetric {
    compare_with_sentinel(baseline, candidate, ideal, RATIO_SENTINEL)
}

/// Compares two summaries with an explicit baseline-zero sentinel.
pub fn compare_with_sentinel(
    baseline: &QuantileSummary,
    candidate: &QuantileSummary,
    ideal: Option<f64>,
    sentinel: f64,
) -> ComparativeMetric {
    ComparativeMetric {
        ratio: Ratio::between(baseline.median, candidate.median, sentinel),
        baseline_median: baseline.median,
        candidate_median: candidate.median,
        gap_to_ideal: ideal.map(|ideal| candidate.median - ideal),
    }
}

/// Outcome of a single observation, weighted by a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Successful observations.
    Success(u64),
    /// Failed observations.
    Failure(u64),
}

/// Accumulated success and failure counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Total weight of successful observations.
    pub success: u64,
    /// Total weight of failed observations.
    pub failure: u64,
}

impl OutcomeCounts {
    /// Sums a sequence of weighted outcomes.
    pub fn tally<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = Outcome>,
    {
        outcomes
            .into_iter()
            .fold(Self::default(), |mut counts, outcome| {
                match outcome {
                    Outcome::Success(count) => counts.success += count,
                    Outcome::Failure(count) => counts.failure += count,
                }
                counts
            })
    }

    /// Success plus failure weight.
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }

    /// Fraction of successful observations; `None` when nothing was observed.
    pub fn success_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.success as f64 / total as f64),
        }
    }

    /// Complement of [`OutcomeCounts::success_rate`].
    pub fn error_rate(&self) -> Option<f64> {
        self.success_rate().map(|rate| 1.0 - rate)
    }
}

/// Empirical CDF of `ratios` evaluated at `threshold`.
///
/// An empty column yields zero.
pub fn fraction_at_or_below(ratios: &[f64], threshold: f64) -> f64 {
    if ratios.is_empty() {
        return 0.0;
    }
    let count = ratios.iter().filter(|ratio| **ratio <= threshold).count();
    count as f64 / ratios.len() as f64
}

/// Rendering input for the ratio CDF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "branch", rename_all = "kebab-case")]
pub enum CdfBranch {
    /// Every ratio is at most one: a single-colour CDF suffices.
    Bounded,
    /// At least one ratio exceeds one: the renderer splits the CDF at one.
    WithOutliers {
        /// Largest ratio in the column.
        max_ratio: f64,
        /// Fraction of entities whose ratio is at most one.
        fraction_less_equal_one: f64,
    },
}

impl CdfBranch {
    /// Selects the branch by testing whether the column maximum exceeds one.
    pub fn select(ratios: &[f64]) -> Self {
        let max_ratio = max_ratio(ratios);
        if max_ratio > 1.0 {
            CdfBranch::WithOutliers {
                max_ratio,
                fraction_less_equal_one: fraction_at_or_below(ratios, 1.0),
            }
        } else {
            CdfBranch::Bounded
        }
    }
}

/// Rendering branch of the CDF over `ratios`.
pub fn cdf_branch(ratios: &[f64]) -> CdfBranch {
    CdfBranch::select(ratios)
}

/// Largest defined ratio, NaN for a column without defined values.
pub fn max_ratio(ratios: &[f64]) -> f64 {
    ratios
        .iter()
        .copied()
        .filter(|ratio| !ratio.is_nan())
        .fold(f64::NAN, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_takes_priority_over_zero_baseline() {
        let ratio = Ratio::between(0.0, 0.0, RATIO_SENTINEL);
        assert_eq!(ratio.value, 1.0);
        assert_eq!(ratio.kind, RatioKind::BothZero);
    }

    #[test]
    fn zero_baseline_uses_sentinel() {
        let ratio = Ratio::between(0.0, 5.0, RATIO_SENTINEL);
        assert_eq!(ratio.value, RATIO_SENTINEL);
        assert_eq!(ratio.kind, RatioKind::BaselineZero);
    }

    #[test]
    fn undefined_medians_propagate() {
        let ratio = Ratio::between(f64::NAN, 2.0, RATIO_SENTINEL);
        assert!(ratio.value.is_nan());
        assert_eq!(ratio.kind, RatioKind::Undefined);
    }

    #[test]
    fn max_ratio_ignores_nan() {
        assert_eq!(max_ratio(&[0.5, f64::NAN, 0.7]), 0.7);
        assert!(max_ratio(&[]).is_nan());
    }
}
