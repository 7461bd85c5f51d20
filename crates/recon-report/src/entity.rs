use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::warn;
use recon_core::errors::{ErrorInfo, ReconError};
use recon_stat::{compare_with_sentinel, summarize, ComparativeMetric, QuantileSummary, Sample};
use serde::{Deserialize, Serialize};

use crate::schema::{MissingPolicy, SchemaDescriptor};

/// Raw per-entity measurements collected by the extraction stage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySamples {
    /// Entity identifier (network, topology or configuration).
    pub id: String,
    /// Position in discovery order.
    pub discovery: usize,
    /// Ideal reference value, when the evaluation has one.
    pub ideal: Option<f64>,
    /// Samples keyed by strategy label, in insertion order.
    pub samples: IndexMap<String, Sample>,
    /// Named scalars read directly from the input.
    pub scalars: BTreeMap<String, f64>,
}

impl EntitySamples {
    /// Empty entity with the provided identity.
    pub fn new(id: impl Into<String>, discovery: usize) -> Self {
        Self {
            id: id.into(),
            discovery,
            ..Self::default()
        }
    }
}

/// Summarised entity, ready for assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Entity identifier.
    pub id: String,
    /// Position in discovery order.
    pub discovery: usize,
    /// Ideal reference value.
    pub ideal: Option<f64>,
    /// Quantile summaries keyed by strategy label.
    pub summaries: IndexMap<String, QuantileSummary>,
    /// Sample means keyed by strategy label.
    pub means: IndexMap<String, f64>,
    /// Named scalars carried over from the input.
    pub scalars: BTreeMap<String, f64>,
    /// Comparative metrics keyed by comparison name.
    pub comparisons: BTreeMap<String, ComparativeMetric>,
}

/// Result of summarising one entity.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    /// Entity contributes a row.
    Kept(EntityRecord),
    /// Entity was excluded by its policy.
    Dropped {
        /// Entity identifier.
        id: String,
        /// Why the entity was excluded.
        reason: ReconError,
    },
}

/// Summarises every strategy of `entity` and computes the declared comparisons.
///
/// Returns an error only for failures that are fatal to the whole run.
pub fn summarize_entity(
    descriptor: &SchemaDescriptor,
    entity: EntitySamples,
    ratio_sentinel: f64,
) -> Result<EntityOutcome, ReconError> {
    let mut summaries = IndexMap::with_capacity(entity.samples.len());
    let mut means = IndexMap::with_capacity(entity.samples.len());
    for (label, sample) in &entity.samples {
        let policy = descriptor.missing_policy(label);
        match resolve(label, sample, policy) {
            Ok(summary) => {
                let mean = if summary.is_undefined() {
                    f64::NAN
                } else {
                    sample.mean().unwrap_or(f64::NAN)
                };
                means.insert(label.clone(), mean);
                summaries.insert(label.clone(), summary);
            }
            Err(err) => {
                let err = err
                    .with_context("entity", entity.id.clone())
                    .with_context("strategy", label.clone());
                if matches!(err, ReconError::UndefinedResult(_)) && policy == MissingPolicy::Abort
                {
                    return Err(err);
                }
                return Ok(EntityOutcome::Dropped {
                    id: entity.id,
                    reason: err,
                });
            }
        }
    }

    let mut comparisons = BTreeMap::new();
    for spec in &descriptor.comparisons {
        match (summaries.get(&spec.baseline), summaries.get(&spec.candidate)) {
            (Some(baseline), Some(candidate)) => {
                comparisons.insert(
                    spec.name.clone(),
                    compare_with_sentinel(baseline, candidate, entity.ideal, ratio_sentinel),
                );
            }
            _ => warn!(
                "{}: cannot compute {} without both {} and {}",
                entity.id, spec.name, spec.baseline, spec.candidate
            ),
        }
    }

    Ok(EntityOutcome::Kept(EntityRecord {
        id: entity.id,
        discovery: entity.discovery,
        ideal: entity.ideal,
        summaries,
        means,
        scalars: entity.scalars,
        comparisons,
    }))
}

fn resolve(
    label: &str,
    sample: &Sample,
    policy: MissingPolicy,
) -> Result<QuantileSummary, ReconError> {
    let degraded = sample.is_empty() || sample.has_missing();
    if !degraded {
        return summarize(sample);
    }
    match policy {
        MissingPolicy::Undefined => Ok(QuantileSummary::undefined()),
        MissingPolicy::Abort => Err(ReconError::UndefinedResult(
            ErrorInfo::new(
                "strategy_without_solution",
                format!("{label} has no solution"),
            )
            .with_hint("this strategy must always converge; the run is aborted"),
        )),
        MissingPolicy::DropEntity if sample.is_empty() => Err(ReconError::DegenerateSample(
            ErrorInfo::new("empty_sample", format!("{label} produced no measurement")),
        )),
        MissingPolicy::DropEntity => Err(ReconError::UndefinedResult(ErrorInfo::new(
            "strategy_without_solution",
            format!("{label} has no solution"),
        ))),
    }
}
