use std::error::Error;

use log::{debug, error, warn};
use recon_report::{run, run_all, EvaluationKind, RunReport};

use crate::SourceArgs;

fn print_report(report: &RunReport) {
    debug!(
        "evaluation {}: {} rows, summary layout {}",
        report.kind, report.summary.rows, report.summary.provenance.schema
    );
    for file in &report.skipped_files {
        warn!("evaluation {}: skipped {file}", report.kind);
    }
    if !report.dropped_entities.is_empty() {
        warn!(
            "evaluation {}: dropped {}",
            report.kind,
            report.dropped_entities.join(", ")
        );
    }
    for path in &report.written {
        println!("{}", path.display());
    }
}

pub fn run_one(evaluation: &str, source: &SourceArgs) -> Result<(), Box<dyn Error>> {
    let kind: EvaluationKind = evaluation.parse()?;
    let ctx = source.context()?;
    let report = run(&ctx, kind)?;
    print_report(&report);
    Ok(())
}

pub fn run_every(source: &SourceArgs) -> Result<(), Box<dyn Error>> {
    let ctx = source.context()?;
    let mut failed = Vec::new();
    for (kind, outcome) in run_all(&ctx) {
        match outcome {
            Ok(report) => print_report(&report),
            Err(err) => {
                error!("evaluation {kind} failed: {err}");
                failed.push(kind.to_string());
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("evaluations failed: {}", failed.join(", ")).into())
    }
}
