//! Structured error types shared across the recon crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`ReconError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (file paths, entity identifiers, strategies).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the evaluation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ReconError {
    /// An input file is not well-formed structured data.
    #[error("parse error: {0}")]
    Parse(ErrorInfo),
    /// A required field is absent or has the wrong shape.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// A strategy that must always converge produced no result.
    #[error("undefined result: {0}")]
    UndefinedResult(ErrorInfo),
    /// A sample is empty (or unusable) after filtering.
    #[error("degenerate sample: {0}")]
    DegenerateSample(ErrorInfo),
    /// Filesystem access failures.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization of the dataset or the scalar summary failed.
    #[error("export error: {0}")]
    Export(ErrorInfo),
    /// Configuration could not be loaded or is inconsistent.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl ReconError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ReconError::Parse(info)
            | ReconError::Schema(info)
            | ReconError::UndefinedResult(info)
            | ReconError::DegenerateSample(info)
            | ReconError::Io(info)
            | ReconError::Export(info)
            | ReconError::Config(info) => info,
        }
    }

    /// True for errors raised while reading a single input file.
    ///
    /// These are the only errors a per-evaluation file policy may downgrade to
    /// a warning.
    pub fn is_file_level(&self) -> bool {
        matches!(self, ReconError::Parse(_) | ReconError::Schema(_))
    }

    /// Attaches an additional context entry, preserving the error family.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self {
            ReconError::Parse(info) => ReconError::Parse(info.with_context(key, value)),
            ReconError::Schema(info) => ReconError::Schema(info.with_context(key, value)),
            ReconError::UndefinedResult(info) => {
                ReconError::UndefinedResult(info.with_context(key, value))
            }
            ReconError::DegenerateSample(info) => {
                ReconError::DegenerateSample(info.with_context(key, value))
            }
            ReconError::Io(info) => ReconError::Io(info.with_context(key, value)),
            ReconError::Export(info) => ReconError::Export(info.with_context(key, value)),
            ReconError::Config(info) => ReconError::Config(info.with_context(key, value)),
        }
    }
}
