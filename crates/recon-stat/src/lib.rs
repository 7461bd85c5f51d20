#![deny(missing_docs)]
#![doc = "Quantile summaries and comparative metrics for reconfiguration benchmark results."]

/// Cross-strategy ratios, outcome rates and CDF branch selection.
pub mod compare;
/// Sample container and the five point quantile summarizer.
pub mod quantile;

pub use compare::{
    cdf_branch, compare, compare_with_sentinel, fraction_at_or_below, max_ratio, CdfBranch,
    ComparativeMetric, Outcome, OutcomeCounts, Ratio, RatioKind, RATIO_SENTINEL,
};
pub use quantile::{percentile, summarize, Probability, QuantileSummary, Sample, TUKEY_FENCE};
