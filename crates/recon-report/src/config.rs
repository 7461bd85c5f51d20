use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use recon_core::errors::{ErrorInfo, ReconError};
use recon_stat::RATIO_SENTINEL;
use serde::{Deserialize, Serialize};

use crate::schema::EvaluationKind;
use crate::serde::from_yaml_slice;

/// Formatting knobs applied by the export adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Single-byte field delimiter of the tabular blob.
    #[serde(default = "OutputSpec::default_delimiter")]
    pub delimiter: char,
    /// Fixed number of decimals; full precision when absent.
    #[serde(default)]
    pub precision: Option<usize>,
}

impl OutputSpec {
    fn default_delimiter() -> char {
        ','
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            delimiter: Self::default_delimiter(),
            precision: None,
        }
    }
}

/// YAML configuration of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Directory holding the `result_<N>` folders.
    #[serde(default = "ReconConfig::default_root")]
    pub root: PathBuf,
    /// Subfolder of `root` holding the precomputed result sets.
    #[serde(default = "ReconConfig::default_precomputed_dir")]
    pub precomputed_dir: String,
    /// Ratio assigned when the baseline median is zero.
    #[serde(default = "ReconConfig::default_ratio_sentinel")]
    pub ratio_sentinel: f64,
    /// Export formatting.
    #[serde(default)]
    pub output: OutputSpec,
}

impl ReconConfig {
    fn default_root() -> PathBuf {
        PathBuf::from("eval_sigcomm2021")
    }

    fn default_precomputed_dir() -> String {
        "precomputed_results".to_string()
    }

    fn default_ratio_sentinel() -> f64 {
        RATIO_SENTINEL
    }

    /// Checks values serde cannot validate on its own.
    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.output.delimiter.is_ascii() || self.output.delimiter == '\n' {
            return Err(ReconError::Config(
                ErrorInfo::new("invalid_delimiter", "delimiter must be a single ASCII byte")
                    .with_context("delimiter", self.output.delimiter.to_string()),
            ));
        }
        if self.ratio_sentinel.is_nan() || self.ratio_sentinel <= 1.0 {
            return Err(ReconError::Config(
                ErrorInfo::new("invalid_sentinel", "ratio sentinel must be greater than one")
                    .with_context("ratio_sentinel", self.ratio_sentinel.to_string()),
            ));
        }
        Ok(())
    }
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            root: Self::default_root(),
            precomputed_dir: Self::default_precomputed_dir(),
            ratio_sentinel: Self::default_ratio_sentinel(),
            output: OutputSpec::default(),
        }
    }
}

/// Loads and validates a configuration from the provided YAML path.
pub fn load_config(path: &Path) -> Result<ReconConfig, ReconError> {
    let bytes = fs::read(path).map_err(|err| {
        ReconError::Io(
            ErrorInfo::new("config_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let config: ReconConfig = from_yaml_slice(&bytes)
        .map_err(|err| err.with_context("path", path.display().to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Which stored result set a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResultSource {
    /// Results shipped with the artifact.
    Precomputed,
    /// Results produced by a fresh benchmark run.
    #[default]
    Fresh,
}

impl Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultSource::Precomputed => write!(f, "precomputed"),
            ResultSource::Fresh => write!(f, "fresh"),
        }
    }
}

/// Process-wide selection of the result set, fixed for the whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalContext {
    root: PathBuf,
    precomputed_dir: String,
    source: ResultSource,
    ratio_sentinel: f64,
    output: OutputSpec,
}

impl EvalContext {
    /// Builds the context from a validated configuration.
    pub fn new(config: &ReconConfig, source: ResultSource) -> Result<Self, ReconError> {
        config.validate()?;
        Ok(Self {
            root: config.root.clone(),
            precomputed_dir: config.precomputed_dir.clone(),
            source,
            ratio_sentinel: config.ratio_sentinel,
            output: config.output.clone(),
        })
    }

    /// Result set selected for the run.
    pub fn source(&self) -> ResultSource {
        self.source
    }

    /// Ratio assigned when a baseline median is zero.
    pub fn ratio_sentinel(&self) -> f64 {
        self.ratio_sentinel
    }

    /// Export formatting.
    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    /// Directory holding the results of `kind` for the selected source.
    pub fn result_dir(&self, kind: EvaluationKind) -> PathBuf {
        match self.source {
            ResultSource::Precomputed => self
                .root
                .join(&self.precomputed_dir)
                .join(kind.result_dir_name()),
            ResultSource::Fresh => self.root.join(kind.result_dir_name()),
        }
    }
}
