use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use recon_core::errors::{ErrorInfo, ReconError};
use recon_core::provenance::{RunProvenance, SchemaVersion};
use recon_stat::CdfBranch;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::OutputSpec;
use crate::dataset::{Cell, Dataset};
use crate::serde::to_canonical_json_bytes;

/// Name of the scalar summary written next to the tabular blob.
pub const SUMMARY_FILE: &str = "summary.json";

/// Layout version of [`ScalarSummary`].
pub const SUMMARY_SCHEMA: SchemaVersion = SchemaVersion::new(1, 0);

fn export_error(code: &str, err: impl ToString) -> ReconError {
    ReconError::Export(ErrorInfo::new(code, err.to_string()))
}

/// Serialization knobs of one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Fixed number of decimals; shortest round-trip formatting when absent.
    pub precision: Option<usize>,
    /// File name of the tabular blob.
    pub data_file: String,
    /// Run metadata recorded in the scalar summary.
    pub provenance: RunProvenance,
}

impl ExportOptions {
    /// Options derived from the configured output section.
    pub fn from_output(output: &OutputSpec, data_file: impl Into<String>) -> Self {
        Self {
            // Validated as ASCII by the configuration layer.
            delimiter: output.delimiter as u8,
            precision: output.precision,
            data_file: data_file.into(),
            provenance: RunProvenance::default(),
        }
    }

    /// Sets the run metadata.
    pub fn with_provenance(mut self, provenance: RunProvenance) -> Self {
        self.provenance = provenance;
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_output(&OutputSpec::default(), "data.csv")
    }
}

/// Scalar values consumed by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSummary {
    /// Column headers of the tabular blob.
    pub columns: Vec<String>,
    /// Number of exported rows.
    pub rows: usize,
    /// Dataset-level scalars.
    pub scalars: BTreeMap<String, f64>,
    /// Rendering branch of the ratio CDF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<CdfBranch>,
    /// Run metadata.
    pub provenance: RunProvenance,
}

/// Serialized outputs of one evaluation, not yet written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    /// File name of the tabular blob.
    pub data_file: String,
    /// Delimited text with a header row.
    pub table: Vec<u8>,
    /// Scalar summary as parsed.
    pub summary: ScalarSummary,
    /// Canonical JSON of `summary`.
    pub summary_bytes: Vec<u8>,
    /// Side files: (file name, newline-delimited values).
    pub attachments: Vec<(String, Vec<u8>)>,
}

fn format_number(value: f64, precision: Option<usize>) -> String {
    match precision {
        Some(digits) => format!("{value:.digits$}"),
        None => format!("{value}"),
    }
}

fn format_cell(cell: &Cell, precision: Option<usize>) -> String {
    match cell {
        Cell::Text(text) => text.clone(),
        Cell::Number(value) => format_number(*value, precision),
        Cell::Missing => String::new(),
    }
}

/// Serializes the table, the scalar summary and the attachments.
///
/// Pure: the same dataset and options always yield the same bytes. The
/// timestamp in the summary is whatever `options.provenance` carries.
pub fn export(dataset: &Dataset, options: &ExportOptions) -> Result<ExportBundle, ReconError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new());
    writer
        .write_record(&dataset.columns)
        .map_err(|err| export_error("csv_header", err))?;
    for row in &dataset.rows {
        writer
            .write_record(
                row.cells
                    .iter()
                    .map(|cell| format_cell(cell, options.precision)),
            )
            .map_err(|err| export_error("csv_row", err).with_context("entity", row.id.clone()))?;
    }
    let table = writer
        .into_inner()
        .map_err(|err| export_error("csv_flush", err))?;

    let mut provenance = options.provenance.clone();
    provenance.dataset_hash = format!("{:x}", Sha256::digest(&table));
    provenance.schema = SUMMARY_SCHEMA;
    provenance
        .tool_versions
        .insert("recon-report".to_string(), env!("CARGO_PKG_VERSION").to_string());

    let summary = ScalarSummary {
        columns: dataset.columns.clone(),
        rows: dataset.rows.len(),
        scalars: dataset.scalars.clone(),
        branch: dataset.branch,
        provenance,
    };
    let summary_bytes = to_canonical_json_bytes(&summary)?;

    let attachments = dataset
        .attachments
        .iter()
        .map(|attachment| {
            let mut text = String::new();
            for value in &attachment.values {
                text.push_str(&format_number(*value, options.precision));
                text.push('\n');
            }
            (attachment.file_name.clone(), text.into_bytes())
        })
        .collect();

    Ok(ExportBundle {
        data_file: options.data_file.clone(),
        table,
        summary,
        summary_bytes,
        attachments,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ReconError> {
    fs::write(path, bytes).map_err(|err| {
        ReconError::Io(
            ErrorInfo::new("write", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })
}

/// Replaces `out_dir` with the contents of `bundle`; returns the written paths.
pub fn write_bundle(bundle: &ExportBundle, out_dir: &Path) -> Result<Vec<PathBuf>, ReconError> {
    let io_error = |code: &str, err: std::io::Error| {
        ReconError::Io(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", out_dir.display().to_string()),
        )
    };
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).map_err(|err| io_error("remove_output", err))?;
    }
    fs::create_dir_all(out_dir).map_err(|err| io_error("create_output", err))?;

    let mut written = Vec::with_capacity(bundle.attachments.len() + 2);
    let mut emit = |name: &str, bytes: &[u8]| -> Result<(), ReconError> {
        let path = out_dir.join(name);
        write_file(&path, bytes)?;
        written.push(path);
        Ok(())
    };
    emit(&bundle.data_file, &bundle.table)?;
    emit(SUMMARY_FILE, &bundle.summary_bytes)?;
    for (name, bytes) in &bundle.attachments {
        emit(name, bytes)?;
    }
    Ok(written)
}
