use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use recon_core::errors::{ErrorInfo, ReconError};
use serde_json::Value;
use walkdir::WalkDir;

use crate::schema::{InputFormat, SchemaDescriptor};

fn io_error(code: &str, path: &Path, err: impl ToString) -> ReconError {
    ReconError::Io(
        ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
    )
}

/// File-selection predicate: glob patterns minus reserved names.
#[derive(Debug, Clone)]
pub struct FileSelector {
    globs: GlobSet,
    reserved: BTreeSet<String>,
}

impl FileSelector {
    /// Compiles the provided patterns.
    pub fn new<P, R>(patterns: &[P], reserved: &[R]) -> Result<Self, ReconError>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern.as_ref()).map_err(|err| {
                ReconError::Config(
                    ErrorInfo::new("invalid_pattern", err.to_string())
                        .with_context("pattern", pattern.as_ref()),
                )
            })?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|err| ReconError::Config(ErrorInfo::new("invalid_pattern", err.to_string())))?;
        Ok(Self {
            globs,
            reserved: reserved.iter().map(|r| r.as_ref().to_string()).collect(),
        })
    }

    /// Returns true when `file_name` should be read.
    pub fn matches(&self, file_name: &str) -> bool {
        !self.reserved.contains(file_name) && self.globs.is_match(file_name)
    }
}

/// Parsed content of one input file.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordContent {
    /// Structured JSON document.
    Json(Value),
    /// Raw text.
    Text(String),
}

/// One input file as handed to the extraction stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Full path of the file.
    pub path: PathBuf,
    /// File name without directories.
    pub file_name: String,
    /// Parsed content.
    pub content: RecordContent,
}

impl RawRecord {
    /// Entity identifier derived from the file name (text before the first dot).
    pub fn stem(&self) -> &str {
        self.file_name
            .split('.')
            .next()
            .unwrap_or(self.file_name.as_str())
    }

    /// JSON payload, or a schema error for text records.
    pub fn json(&self) -> Result<&Value, ReconError> {
        match &self.content {
            RecordContent::Json(value) => Ok(value),
            RecordContent::Text(_) => Err(ReconError::Schema(
                ErrorInfo::new("expected_json", "record was loaded as text")
                    .with_context("file", self.file_name.clone()),
            )),
        }
    }

    /// Text payload, or a schema error for JSON records.
    pub fn text(&self) -> Result<&str, ReconError> {
        match &self.content {
            RecordContent::Text(text) => Ok(text),
            RecordContent::Json(_) => Err(ReconError::Schema(
                ErrorInfo::new("expected_text", "record was loaded as JSON")
                    .with_context("file", self.file_name.clone()),
            )),
        }
    }
}

/// Discovers and parses the result files of one evaluation.
#[derive(Debug, Clone)]
pub struct ResultLoader {
    dir: PathBuf,
    selector: FileSelector,
    format: InputFormat,
    required_keys: Vec<String>,
}

impl ResultLoader {
    /// Loader reading JSON files accepted by `selector` from `dir`.
    pub fn new(dir: impl Into<PathBuf>, selector: FileSelector) -> Self {
        Self {
            dir: dir.into(),
            selector,
            format: InputFormat::Json,
            required_keys: Vec::new(),
        }
    }

    /// Loader configured from an evaluation descriptor.
    pub fn from_descriptor(
        dir: impl Into<PathBuf>,
        descriptor: &SchemaDescriptor,
    ) -> Result<Self, ReconError> {
        let selector = FileSelector::new(&descriptor.file_patterns, &descriptor.reserved)?;
        Ok(Self::new(dir, selector)
            .with_format(descriptor.format)
            .with_required_keys(descriptor.required_keys.clone()))
    }

    /// Sets the input format.
    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the JSON pointers every record must contain.
    pub fn with_required_keys(mut self, keys: Vec<String>) -> Self {
        self.required_keys = keys;
        self
    }

    /// Directory the loader reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lazily reads every matching file, in file name order.
    ///
    /// Every item is the outcome for a single file, so the caller can apply
    /// its own per-file policy.
    pub fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<RawRecord, ReconError>> + '_, ReconError> {
        if !self.dir.is_dir() {
            return Err(ReconError::Io(
                ErrorInfo::new("result_dir_missing", "result directory does not exist")
                    .with_context("path", self.dir.display().to_string())
                    .with_hint("run the benchmark first or pass --pre for precomputed results"),
            ));
        }
        let entries = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter();
        Ok(entries.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => return Some(Err(io_error("walk", &self.dir, err))),
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !self.selector.matches(&file_name) {
                return None;
            }
            Some(self.read(entry.path(), file_name))
        }))
    }

    fn read(&self, path: &Path, file_name: String) -> Result<RawRecord, ReconError> {
        let raw = fs::read_to_string(path).map_err(|err| io_error("read", path, err))?;
        let content = match self.format {
            InputFormat::Text => RecordContent::Text(raw),
            InputFormat::Json => {
                let value: Value = serde_json::from_str(&raw).map_err(|err| {
                    ReconError::Parse(
                        ErrorInfo::new("malformed_json", err.to_string())
                            .with_context("file", file_name.clone()),
                    )
                })?;
                self.check_required(&value, &file_name)?;
                RecordContent::Json(value)
            }
        };
        Ok(RawRecord {
            path: path.to_path_buf(),
            file_name,
            content,
        })
    }

    fn check_required(&self, value: &Value, file_name: &str) -> Result<(), ReconError> {
        match self
            .required_keys
            .iter()
            .find(|key| value.pointer(key).is_none())
        {
            Some(key) => Err(ReconError::Schema(
                ErrorInfo::new("missing_key", format!("required key {key} is absent"))
                    .with_context("file", file_name)
                    .with_context("key", key.clone()),
            )),
            None => Ok(()),
        }
    }
}
