use std::path::PathBuf;

use chrono::Utc;
use log::{debug, info, warn};
use recon_core::errors::ReconError;
use recon_core::provenance::RunProvenance;

use crate::config::EvalContext;
use crate::dataset::Dataset;
use crate::entity::{summarize_entity, EntityOutcome};
use crate::export::{export, write_bundle, ExportOptions, ScalarSummary};
use crate::extract::extractor_for;
use crate::loader::ResultLoader;
use crate::schema::{EvaluationKind, FilePolicy};

/// Assembled dataset of one evaluation together with its run metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// Fully built dataset.
    pub dataset: Dataset,
    /// Metadata recorded in the scalar summary.
    pub provenance: RunProvenance,
    /// Files rejected by a `SkipAndWarn` policy.
    pub skipped_files: Vec<String>,
    /// Entities excluded by a missing-value or degenerate-sample policy.
    pub dropped_entities: Vec<String>,
}

/// Outcome of a completed evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Evaluation that ran.
    pub kind: EvaluationKind,
    /// Recreated output folder.
    pub out_dir: PathBuf,
    /// Files written into `out_dir`.
    pub written: Vec<PathBuf>,
    /// Exported scalar summary.
    pub summary: ScalarSummary,
    /// Files rejected by a `SkipAndWarn` policy.
    pub skipped_files: Vec<String>,
    /// Entities excluded from the dataset.
    pub dropped_entities: Vec<String>,
}

/// Loads, summarises and assembles one evaluation without touching the output folder.
pub fn collect(ctx: &EvalContext, kind: EvaluationKind) -> Result<Collected, ReconError> {
    let descriptor = kind.descriptor();
    let dir = ctx.result_dir(kind);
    debug!(
        "evaluation {kind}: reading {} with patterns {:?}",
        dir.display(),
        descriptor.file_patterns
    );
    let loader = ResultLoader::from_descriptor(&dir, &descriptor)?;
    let mut extractor = extractor_for(&descriptor);

    let mut input_files = 0;
    let mut skipped_files = Vec::new();
    for item in loader.records()? {
        let outcome = item.and_then(|record| {
            extractor.ingest(&record)?;
            Ok(record.file_name)
        });
        match outcome {
            Ok(file_name) => {
                input_files += 1;
                info!("{file_name} loaded");
            }
            Err(err) if err.is_file_level() && descriptor.file_policy == FilePolicy::SkipAndWarn => {
                warn!("skipping file: {err}");
                skipped_files.push(err.info().context.get("file").cloned().unwrap_or_default());
            }
            Err(err) => return Err(err.with_context("evaluation", kind.to_string())),
        }
    }
    if input_files == 0 {
        warn!("evaluation {kind}: no input file in {}", dir.display());
    }

    let mut records = Vec::new();
    let mut dropped_entities = Vec::new();
    let entities = extractor
        .finish()
        .map_err(|err| err.with_context("evaluation", kind.to_string()))?;
    for entity in entities {
        match summarize_entity(&descriptor, entity, ctx.ratio_sentinel())
            .map_err(|err| err.with_context("evaluation", kind.to_string()))?
        {
            EntityOutcome::Kept(record) => records.push(record),
            EntityOutcome::Dropped { id, reason } => {
                warn!("dropping {id}: {reason}");
                dropped_entities.push(id);
            }
        }
    }

    let dataset = Dataset::from_descriptor(&descriptor, records)?;
    let provenance = RunProvenance {
        evaluation: kind.result_dir_name(),
        source: ctx.source().to_string(),
        input_files,
        dropped_entities: dropped_entities.len(),
        ..RunProvenance::default()
    };
    Ok(Collected {
        dataset,
        provenance,
        skipped_files,
        dropped_entities,
    })
}

/// Runs one evaluation end to end and replaces its output folder.
///
/// The folder is only touched once the dataset and its serialization are
/// complete, so a fatal error leaves previous outputs in place.
pub fn run(ctx: &EvalContext, kind: EvaluationKind) -> Result<RunReport, ReconError> {
    let descriptor = kind.descriptor();
    let collected = collect(ctx, kind)?;
    let provenance = RunProvenance {
        created_at: Utc::now().to_rfc3339(),
        ..collected.provenance
    };
    let options = ExportOptions::from_output(ctx.output(), descriptor.data_file.clone())
        .with_provenance(provenance);
    let bundle = export(&collected.dataset, &options)?;

    let out_dir = ctx.result_dir(kind).join(&descriptor.output_dir);
    let written = write_bundle(&bundle, &out_dir)?;
    info!(
        "evaluation {kind}: {} rows written to {}",
        bundle.summary.rows,
        out_dir.display()
    );
    Ok(RunReport {
        kind,
        out_dir,
        written,
        summary: bundle.summary,
        skipped_files: collected.skipped_files,
        dropped_entities: collected.dropped_entities,
    })
}

/// Runs every evaluation in numeric order; a failure does not stop the others.
pub fn run_all(ctx: &EvalContext) -> Vec<(EvaluationKind, Result<RunReport, ReconError>)> {
    EvaluationKind::ALL
        .iter()
        .map(|kind| (*kind, run(ctx, *kind)))
        .collect()
}
