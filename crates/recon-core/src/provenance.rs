//! Provenance descriptors attached to every exported scalar summary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Layout version of `summary.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Bumped when a scalar is renamed or removed.
    pub major: u32,
    /// Bumped when scalars are added.
    pub minor: u32,
}

impl SchemaVersion {
    /// Creates a layout version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Provenance information recorded alongside an exported dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RunProvenance {
    /// Evaluation identifier (for example `result_6`).
    pub evaluation: String,
    /// Result set the run read from (`precomputed` or `fresh`).
    pub source: String,
    /// Number of input files consumed by the loader.
    pub input_files: usize,
    /// Number of entities dropped by a missing-value or degenerate-sample policy.
    pub dropped_entities: usize,
    /// SHA256 of the exported tabular blob.
    pub dataset_hash: String,
    /// Layout version of the scalar summary.
    pub schema: SchemaVersion,
    /// ISO-8601 timestamp recording when the export was generated.
    pub created_at: String,
    /// Version map for all tools involved in the run.
    pub tool_versions: BTreeMap<String, String>,
}
